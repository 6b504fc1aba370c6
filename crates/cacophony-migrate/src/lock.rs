//! Advisory lock serializing migration runs across processes.
//!
//! The lock is a single-row table keyed on `lock_id = 1`. Acquiring inserts
//! the row; a primary-key violation means another runner holds it. A run that
//! is killed mid-way leaves the row behind, and `migrate unlock` clears it.

use cacophony_db::{DbError, Store};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::error::{MigrateError, MigrateResult};

const LOCK_ROW: &str = "1";

/// Who holds the lock and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockInfo {
    pub holder: String,
    pub acquired_at: String,
}

/// Single-row lock table in the target database.
pub struct MigrationLock {
    store: Arc<dyn Store>,
    table: String,
}

impl MigrationLock {
    /// `table` must be a plain identifier; config validation guarantees it.
    pub fn new(store: Arc<dyn Store>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// A holder id unique to this process and run: `<prefix>:<pid>:<uuid>`.
    pub fn holder_id(prefix: &str) -> String {
        format!(
            "{prefix}:{}:{}",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        )
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn ensure(&self) -> MigrateResult<()> {
        self.store
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                     lock_id     INTEGER PRIMARY KEY,
                     holder      VARCHAR NOT NULL,
                     acquired_at TIMESTAMP NOT NULL
                 )",
                self.table
            ))
            .await?;
        Ok(())
    }

    /// Take the lock for `holder`, failing with [`MigrateError::LockHeld`] if
    /// any runner (including this holder) already has it.
    pub async fn acquire(&self, holder: &str) -> MigrateResult<()> {
        self.ensure().await?;
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        let inserted = self
            .store
            .execute(
                &format!(
                    "INSERT INTO {} (lock_id, holder, acquired_at) \
                     VALUES (CAST(? AS INTEGER), ?, CAST(? AS TIMESTAMP))",
                    self.table
                ),
                &[LOCK_ROW, holder, now.as_str()],
            )
            .await;

        match inserted {
            Ok(_) => {
                log::debug!("Acquired migration lock as {holder}");
                Ok(())
            }
            Err(DbError::ConstraintViolation(_)) => {
                let current = self.current().await?;
                Err(MigrateError::LockHeld {
                    holder: current
                        .as_ref()
                        .map_or_else(|| "unknown".to_string(), |c| c.holder.clone()),
                    since: current.map_or_else(|| "unknown".to_string(), |c| c.acquired_at),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release the lock if `holder` owns it. Returns whether a row was removed.
    pub async fn release(&self, holder: &str) -> MigrateResult<bool> {
        let deleted = self
            .store
            .execute(
                &format!(
                    "DELETE FROM {} WHERE lock_id = CAST(? AS INTEGER) AND holder = ?",
                    self.table
                ),
                &[LOCK_ROW, holder],
            )
            .await?;
        if deleted == 0 {
            log::warn!("Migration lock was not held by {holder} at release");
        }
        Ok(deleted > 0)
    }

    /// Remove the lock regardless of holder, returning who held it.
    pub async fn force_release(&self) -> MigrateResult<Option<LockInfo>> {
        let current = self.current().await?;
        if current.is_some() {
            self.store
                .execute(&format!("DELETE FROM {}", self.table), &[])
                .await?;
        }
        Ok(current)
    }

    /// Current holder, if any.
    pub async fn current(&self) -> MigrateResult<Option<LockInfo>> {
        if !self.store.relation_exists(&self.table).await? {
            return Ok(None);
        }
        let rows = self
            .store
            .query_rows(
                &format!(
                    "SELECT holder, CAST(acquired_at AS VARCHAR) FROM {}",
                    self.table
                ),
                &[],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| {
            let mut cols = row.into_iter();
            LockInfo {
                holder: cols.next().flatten().unwrap_or_default(),
                acquired_at: cols.next().flatten().unwrap_or_default(),
            }
        }))
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
