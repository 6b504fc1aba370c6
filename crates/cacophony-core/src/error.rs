//! Error types for cacophony-core

use thiserror::Error;

/// Core error type for Cacophony migrations
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Target not defined in the configuration
    #[error("[C003] Target '{name}' not found. Available targets: {available}")]
    TargetNotFound { name: String, available: String },

    /// C004: Malformed migration identifier
    #[error("[C004] Invalid migration id '{id}': {reason}")]
    InvalidMigrationId { id: String, reason: String },

    /// C005: IO error with file path context
    #[error("[C005] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C006: YAML parse error
    #[error("[C006] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
