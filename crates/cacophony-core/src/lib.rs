//! cacophony-core - Core library for Cacophony schema migrations
//!
//! This crate provides the configuration file format, the strongly-typed
//! migration identifier, and the error types shared by the store, runner,
//! and CLI crates.

pub mod config;
pub mod error;
pub mod migration_id;

pub use config::{Config, DatabaseConfig, MigrationsConfig, TargetConfig};
pub use error::{CoreError, CoreResult};
pub use migration_id::MigrationId;
