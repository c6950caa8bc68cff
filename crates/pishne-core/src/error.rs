//! Error types for `pishne-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A key (record id or business code) did not match any record.
  #[error("{table}: record not found: {key}")]
  NotFound { table: String, key: String },

  /// A mutation was rejected before touching the table.
  #[error("{table}: invalid value for {field}: {reason}")]
  Validation {
    table:  String,
    field:  String,
    reason: String,
  },

  #[error("invalid schema: {0}")]
  Schema(String),

  #[error("invalid record id: {0:?}")]
  InvalidRecId(String),

  #[error("invalid record timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("invalid record status: {0:?}")]
  InvalidStatus(String),

  #[error("layer not found in store: {0}")]
  MissingLayer(String),

  #[error("missing column: {0}")]
  MissingColumn(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }

  pub fn is_validation(&self) -> bool { matches!(self, Self::Validation { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
