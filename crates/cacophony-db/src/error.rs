//! Error types for cacophony-db

use thiserror::Error;

/// Store operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Primary key, unique, or NOT NULL constraint violated (D004)
    #[error("[D004] Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Transaction management error (D005)
    #[error("[D005] Transaction failed: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants for catalog or
        // constraint failures, so classify by message prefix.
        let msg = err.to_string();
        if msg.contains("Constraint Error") {
            DbError::ConstraintViolation(msg)
        } else if (msg.contains("Table with name") || msg.contains("Table or view with name"))
            && msg.contains("does not exist")
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

impl DbError {
    /// Whether the error is a constraint violation (duplicate key etc.).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation(_))
    }
}
