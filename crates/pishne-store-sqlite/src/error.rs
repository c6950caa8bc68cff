//! Error type for `pishne-store-sqlite`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pishne_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// The data folder holds no database file.
  #[error("no database found in {}", .0.display())]
  NoDatabase(PathBuf),

  /// A new database was requested in a folder that already holds one.
  #[error("a database already exists at {}", .0.display())]
  DatabaseExists(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
