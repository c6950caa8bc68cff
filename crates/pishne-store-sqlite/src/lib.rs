//! SQLite backend for the Pishne registry.
//!
//! A store is a single GeoPackage file holding one attribute table per
//! registry layer. Files are versioned by name inside a data folder; the
//! newest one is the live database and older ones are snapshots.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DB_PREFIX, DB_SUFFIX, SqliteStore, db_file_name, latest_database};

#[cfg(test)]
mod tests;
