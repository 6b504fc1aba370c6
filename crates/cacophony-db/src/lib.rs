//! cacophony-db - Store abstraction for Cacophony migrations
//!
//! This crate provides the `Store` capability the migration runner consumes
//! and its DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use crate::duckdb::DuckDbStore;
pub use error::{DbError, DbResult};
pub use traits::{Row, Store};
