//! Applied-state ledger stored in the target database.
//!
//! One row per applied unit: `(id VARCHAR PRIMARY KEY, applied_at TIMESTAMP)`.
//! The primary key turns a racing double-apply into [`MigrateError::DuplicateApply`].

use cacophony_db::{DbError, Store};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{MigrateError, MigrateResult};

/// Format used when binding timestamps as text parameters.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One applied migration as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: String,
    pub applied_at: String,
}

/// Durable record of applied migration ids.
pub struct Ledger {
    store: Arc<dyn Store>,
    table: String,
}

impl Ledger {
    /// `table` must be a plain identifier; config validation guarantees it.
    pub fn new(store: Arc<dyn Store>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table if it does not exist.
    pub async fn ensure(&self) -> MigrateResult<()> {
        self.store
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                     id         VARCHAR PRIMARY KEY,
                     applied_at TIMESTAMP NOT NULL
                 )",
                self.table
            ))
            .await?;
        Ok(())
    }

    pub async fn exists(&self) -> MigrateResult<bool> {
        Ok(self.store.relation_exists(&self.table).await?)
    }

    pub async fn is_applied(&self, id: &str) -> MigrateResult<bool> {
        if !self.exists().await? {
            return Ok(false);
        }
        let rows = self
            .store
            .query_rows(
                &format!("SELECT COUNT(*) FROM {} WHERE id = ?", self.table),
                &[id],
            )
            .await?;
        let count = rows
            .first()
            .and_then(|r| r.first().cloned().flatten())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);
        Ok(count > 0)
    }

    /// Insert the row for `id`.
    pub async fn record_applied(&self, id: &str, at: DateTime<Utc>) -> MigrateResult<()> {
        let at = at.format(TIMESTAMP_FORMAT).to_string();
        self.store
            .execute(
                &format!(
                    "INSERT INTO {} (id, applied_at) VALUES (?, CAST(? AS TIMESTAMP))",
                    self.table
                ),
                &[id, at.as_str()],
            )
            .await
            .map_err(|e| match e {
                DbError::ConstraintViolation(_) => MigrateError::DuplicateApply {
                    id: id.to_string(),
                },
                other => MigrateError::Store(other),
            })?;
        Ok(())
    }

    /// Delete the row for `id`.
    pub async fn record_reverted(&self, id: &str) -> MigrateResult<()> {
        let deleted = self
            .store
            .execute(&format!("DELETE FROM {} WHERE id = ?", self.table), &[id])
            .await?;
        if deleted == 0 {
            return Err(MigrateError::NotApplied { id: id.to_string() });
        }
        Ok(())
    }

    /// Applied ids; empty when the ledger table has not been created yet.
    pub async fn applied_ids(&self) -> MigrateResult<BTreeSet<String>> {
        Ok(self.entries().await?.into_iter().map(|e| e.id).collect())
    }

    /// All rows ordered by id.
    pub async fn entries(&self) -> MigrateResult<Vec<LedgerEntry>> {
        if !self.exists().await? {
            return Ok(Vec::new());
        }
        let rows = self
            .store
            .query_rows(
                &format!(
                    "SELECT id, CAST(applied_at AS VARCHAR) FROM {} ORDER BY id",
                    self.table
                ),
                &[],
            )
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let id = cols.next().flatten()?;
                let applied_at = cols.next().flatten().unwrap_or_default();
                Some(LedgerEntry { id, applied_at })
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
