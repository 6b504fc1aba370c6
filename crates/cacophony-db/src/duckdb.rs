//! DuckDB store implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Row, Store};
use async_trait::async_trait;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB-backed [`Store`]
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    transactional_ddl: bool,
}

impl DuckDbStore {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::from_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Open an existing database file without write access.
    ///
    /// Unlike [`DuckDbStore::from_path`], a missing file is an error rather
    /// than a freshly created empty database.
    pub fn open_read_only(path: &Path) -> DbResult<Self> {
        if !path.exists() {
            return Err(DbError::ConnectionError(format!(
                "database file does not exist: {}",
                path.display()
            )));
        }
        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let conn = Connection::open_with_flags(path, config)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            transactional_ddl: true,
        }
    }

    /// Report DDL as non-transactional so callers run every statement in
    /// auto-commit mode.
    pub fn without_transactional_ddl(mut self) -> Self {
        self.transactional_ddl = false;
        self
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        let conn = self.lock()?;
        log::debug!("execute: {sql}");
        Ok(conn.execute(sql, duckdb::params_from_iter(params))?)
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        log::debug!("execute batch:\n{sql}");
        Ok(conn.execute_batch(sql)?)
    }

    /// Query rows synchronously, coercing every column to text
    fn query_rows_sync(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(duckdb::params_from_iter(params), |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count)
                    .map(|i| column_as_string(row, i))
                    .collect::<Row>())
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        // Handle schema-qualified names
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };

        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = ? AND table_name = ?",
            duckdb::params![schema, table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn transaction_statement(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        log::debug!("{sql}");
        conn.execute_batch(sql)
            .map_err(|e| DbError::TransactionError(format!("{sql} failed: {e}")))
    }
}

/// Read a column value as text, trying multiple DuckDB types.
///
/// DuckDB integer columns return `None` for `Option<String>`, so we try
/// String -> i64 -> f64 -> bool before treating the value as NULL.
fn column_as_string(row: &duckdb::Row<'_>, idx: usize) -> Option<String> {
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Some(s);
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Some(n.to_string());
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return Some(f.to_string());
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return Some(b.to_string());
    }
    None
}

#[async_trait]
impl Store for DuckDbStore {
    async fn execute(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.execute_sync(sql, params)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_rows(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql, params)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    fn supports_transactional_ddl(&self) -> bool {
        self.transactional_ddl
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction_statement("BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_statement("COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_statement("ROLLBACK")
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
