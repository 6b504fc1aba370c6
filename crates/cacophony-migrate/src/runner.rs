//! Reconciles the registry against the ledger and executes units.
//!
//! Units run strictly one at a time in id order. The first failure stops the
//! run; units applied before it stay applied and recorded. When the store
//! supports transactional DDL, a unit and its ledger update commit together,
//! so a failed unit leaves nothing behind. Otherwise a failed unit may leave
//! partial schema changes that the operator must inspect.

use cacophony_core::{MigrationId, MigrationsConfig};
use cacophony_db::Store;
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use crate::lock::MigrationLock;
use crate::registry::Registry;
use crate::status::{AppliedMigration, PendingMigration, StatusReport};
use crate::unit::{MigrationUnit, Reversibility};

/// Which way a run moves the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// The unit a run stopped at.
#[derive(Debug)]
pub struct UnitFailure {
    pub id: MigrationId,
    pub error: MigrateError,
}

/// Outcome of [`Runner::apply_pending`] or [`Runner::revert`].
#[derive(Debug)]
pub struct RunReport {
    pub direction: Direction,
    /// Units that completed, in execution order.
    pub completed: Vec<MigrationId>,
    /// Set when a unit failed; no unit after it was attempted.
    pub failure: Option<UnitFailure>,
}

impl RunReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            completed: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Collapse into the completed ids, or [`MigrateError::UnitFailed`].
    pub fn into_result(self) -> MigrateResult<Vec<MigrationId>> {
        match self.failure {
            None => Ok(self.completed),
            Some(failure) => Err(MigrateError::UnitFailed {
                id: failure.id,
                direction: self.direction,
                completed: self.completed,
                source: Box::new(failure.error),
            }),
        }
    }
}

/// Applies and reverts registered units against one store.
pub struct Runner {
    store: Arc<dyn Store>,
    registry: Registry,
    ledger: Ledger,
    lock: Option<MigrationLock>,
    holder: String,
}

impl Runner {
    /// Runner with the default ledger and lock tables and locking enabled.
    pub fn new(store: Arc<dyn Store>, registry: Registry) -> Self {
        Self::from_config(store, registry, &MigrationsConfig::default())
    }

    pub fn from_config(
        store: Arc<dyn Store>,
        registry: Registry,
        config: &MigrationsConfig,
    ) -> Self {
        let ledger = Ledger::new(Arc::clone(&store), config.ledger_table.clone());
        let lock = config
            .lock
            .then(|| MigrationLock::new(Arc::clone(&store), config.lock_table.clone()));
        Self {
            store,
            registry,
            ledger,
            lock,
            holder: MigrationLock::holder_id("cacophony"),
        }
    }

    /// Identify this runner in the lock table.
    pub fn with_lock_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    /// Skip the advisory lock.
    pub fn without_lock(mut self) -> Self {
        self.lock = None;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn lock(&self) -> Option<&MigrationLock> {
        self.lock.as_ref()
    }

    pub fn lock_holder(&self) -> &str {
        &self.holder
    }

    fn check_target(&self, target: Option<&str>) -> MigrateResult<()> {
        match target {
            Some(id) if !self.registry.contains(id) => Err(MigrateError::UnknownTarget {
                id: id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    async fn pending_units(&self, target: Option<&str>) -> MigrateResult<Vec<&dyn MigrationUnit>> {
        let applied = self.ledger.applied_ids().await?;
        Ok(self
            .registry
            .list()
            .filter(|u| !applied.contains(u.id().as_str()))
            .filter(|u| target.map_or(true, |t| u.id().as_str() <= t))
            .collect())
    }

    async fn revert_units(&self, count: usize) -> MigrateResult<Vec<&dyn MigrationUnit>> {
        if count == 0 {
            return Err(MigrateError::InvalidCount);
        }
        let applied = self.ledger.applied_ids().await?;
        Ok(self
            .registry
            .list()
            .rev()
            .filter(|u| applied.contains(u.id().as_str()))
            .take(count)
            .collect())
    }

    /// Ids `apply_pending(target)` would apply, without executing anything.
    pub async fn plan_pending(&self, target: Option<&str>) -> MigrateResult<Vec<MigrationId>> {
        self.check_target(target)?;
        Ok(self
            .pending_units(target)
            .await?
            .into_iter()
            .map(|u| u.id().clone())
            .collect())
    }

    /// Ids `revert(count)` would reverse, in reversal order.
    pub async fn plan_revert(&self, count: usize) -> MigrateResult<Vec<MigrationId>> {
        Ok(self
            .revert_units(count)
            .await?
            .into_iter()
            .map(|u| u.id().clone())
            .collect())
    }

    /// Apply every pending unit in id order, up to and including `target`.
    ///
    /// Errors returned directly (unknown target, lock held, ledger
    /// unreadable) mean nothing was executed. Unit failures are reported in
    /// the [`RunReport`].
    pub async fn apply_pending(&self, target: Option<&str>) -> MigrateResult<RunReport> {
        self.check_target(target)?;
        self.ledger.ensure().await?;
        self.with_lock(self.apply_locked(target)).await
    }

    /// Reverse the `count` most recently applied units, by id order.
    pub async fn revert(&self, count: usize) -> MigrateResult<RunReport> {
        if count == 0 {
            return Err(MigrateError::InvalidCount);
        }
        self.ledger.ensure().await?;
        self.with_lock(self.revert_locked(count)).await
    }

    async fn with_lock<F>(&self, run: F) -> MigrateResult<RunReport>
    where
        F: std::future::Future<Output = MigrateResult<RunReport>>,
    {
        let Some(lock) = &self.lock else {
            return run.await;
        };
        lock.acquire(&self.holder).await?;
        let result = run.await;
        if let Err(e) = lock.release(&self.holder).await {
            log::warn!(
                "Failed to release migration lock in {}: {e}. Clear it with `migrate unlock`",
                lock.table()
            );
        }
        result
    }

    async fn apply_locked(&self, target: Option<&str>) -> MigrateResult<RunReport> {
        let pending = self.pending_units(target).await?;
        let latest_applied = self.ledger.applied_ids().await?.into_iter().next_back();
        let mut report = RunReport::new(Direction::Up);

        if pending.is_empty() {
            log::info!("No pending migrations");
            return Ok(report);
        }

        for unit in pending {
            if let Some(latest) = latest_applied.as_deref() {
                if unit.id().as_str() < latest {
                    log::warn!(
                        "Applying {} out of order: {latest} is already applied",
                        unit.id()
                    );
                }
            }

            let started = Instant::now();
            match self.run_unit(unit, Direction::Up).await {
                Ok(()) => {
                    log::info!(
                        "Applied {} ({:.2}s)",
                        unit.id(),
                        started.elapsed().as_secs_f64()
                    );
                    report.completed.push(unit.id().clone());
                }
                Err(error) => {
                    log::error!("Migration {} failed: {error}", unit.id());
                    report.failure = Some(UnitFailure {
                        id: unit.id().clone(),
                        error,
                    });
                    break;
                }
            }
        }
        Ok(report)
    }

    async fn revert_locked(&self, count: usize) -> MigrateResult<RunReport> {
        let to_revert = self.revert_units(count).await?;
        let mut report = RunReport::new(Direction::Down);

        if to_revert.is_empty() {
            log::info!("No applied migrations to revert");
            return Ok(report);
        }

        for unit in to_revert {
            if unit.reversibility() == Reversibility::Irreversible {
                log::warn!(
                    "{} is irreversible: its data changes stay, only the ledger entry is removed",
                    unit.id()
                );
            }

            let started = Instant::now();
            match self.run_unit(unit, Direction::Down).await {
                Ok(()) => {
                    log::info!(
                        "Reverted {} ({:.2}s)",
                        unit.id(),
                        started.elapsed().as_secs_f64()
                    );
                    report.completed.push(unit.id().clone());
                }
                Err(error) => {
                    log::error!("Reverting {} failed: {error}", unit.id());
                    report.failure = Some(UnitFailure {
                        id: unit.id().clone(),
                        error,
                    });
                    break;
                }
            }
        }
        Ok(report)
    }

    /// Run one unit and its ledger update, inside a transaction when possible.
    async fn run_unit(&self, unit: &dyn MigrationUnit, direction: Direction) -> MigrateResult<()> {
        if !(unit.transactional() && self.store.supports_transactional_ddl()) {
            log::debug!("Running {} {direction} without a transaction", unit.id());
            return self.execute_unit(unit, direction).await;
        }

        self.store.begin().await?;
        let result = self.execute_unit(unit, direction).await;
        match result {
            Ok(()) => {
                if let Err(commit_err) = self.store.commit().await {
                    if let Err(e) = self.store.rollback().await {
                        log::warn!("Rollback after failed commit of {} failed: {e}", unit.id());
                    }
                    return Err(commit_err.into());
                }
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback().await {
                    log::warn!("Rollback of {} failed: {rollback_err}", unit.id());
                }
                Err(e)
            }
        }
    }

    async fn execute_unit(&self, unit: &dyn MigrationUnit, direction: Direction) -> MigrateResult<()> {
        let id = unit.id().as_str();
        match direction {
            Direction::Up => {
                unit.up(self.store.as_ref()).await?;
                self.ledger.record_applied(id, Utc::now()).await
            }
            Direction::Down => {
                unit.down(self.store.as_ref()).await?;
                self.ledger.record_reverted(id).await
            }
        }
    }

    /// Applied, pending, and orphaned migrations. Read-only: never creates
    /// the ledger table.
    pub async fn status(&self) -> MigrateResult<StatusReport> {
        let entries = self.ledger.entries().await?;

        let mut applied = Vec::new();
        let mut orphaned = Vec::new();
        for entry in entries {
            match self.registry.get(&entry.id) {
                Some(unit) => applied.push(AppliedMigration {
                    id: unit.id().clone(),
                    description: unit.description().to_string(),
                    applied_at: entry.applied_at,
                    reversibility: unit.reversibility(),
                }),
                None => {
                    log::warn!(
                        "Ledger records {} but no such migration is registered",
                        entry.id
                    );
                    orphaned.push(entry);
                }
            }
        }

        let pending = self
            .pending_units(None)
            .await?
            .into_iter()
            .map(|u| PendingMigration {
                id: u.id().clone(),
                description: u.description().to_string(),
                reversibility: u.reversibility(),
            })
            .collect();

        let lock = match &self.lock {
            Some(lock) => lock.current().await?,
            None => None,
        };

        Ok(StatusReport {
            applied,
            pending,
            orphaned,
            lock,
        })
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
