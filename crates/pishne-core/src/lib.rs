//! Core types for the Pishne action registry.
//!
//! Record tables with stamped, soft-deleted records and derived columns; the
//! six registry tables; reporting views; and the [`store::TableStore`]
//! abstraction. This crate does no I/O of its own.

pub mod database;
pub mod error;
pub mod filter;
pub mod flows;
pub mod frame;
pub mod metadata;
pub mod record;
pub mod report;
pub mod schema;
pub mod store;
pub mod table;
pub mod tables;
pub mod value;

pub use error::{Error, Result};
