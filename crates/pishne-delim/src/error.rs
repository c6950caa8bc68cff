//! Error type for `pishne-delim`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pishne_core::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A two-column file lacks its key or value header.
  #[error("missing column: {0}")]
  MissingColumn(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
