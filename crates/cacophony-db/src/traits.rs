//! Store trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// One result row with every column coerced to text (`None` for NULL).
pub type Row = Vec<Option<String>>;

/// The database capability the migration runner consumes.
///
/// Implementations must be Send + Sync for async operation. Calls are
/// awaited one at a time; the runner never issues overlapping statements.
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute one statement with positional `?` text parameters,
    /// returning affected rows
    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Execute multiple `;`-separated statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return all rows as text
    async fn query_rows(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Whether DDL can run inside `begin` / `commit`
    fn supports_transactional_ddl(&self) -> bool;

    /// Open a transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
