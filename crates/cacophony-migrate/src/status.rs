//! Read-only view of applied and pending migrations.

use cacophony_core::MigrationId;
use serde::Serialize;

use crate::ledger::LedgerEntry;
use crate::lock::LockInfo;
use crate::unit::Reversibility;

/// A registered unit the ledger records as applied.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedMigration {
    pub id: MigrationId,
    pub description: String,
    pub applied_at: String,
    pub reversibility: Reversibility,
}

/// A registered unit not yet applied.
#[derive(Debug, Clone, Serialize)]
pub struct PendingMigration {
    pub id: MigrationId,
    pub description: String,
    pub reversibility: Reversibility,
}

/// Result of [`Runner::status`](crate::Runner::status).
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Applied units in id order.
    pub applied: Vec<AppliedMigration>,
    /// Pending units in the order `migrate up` would apply them.
    pub pending: Vec<PendingMigration>,
    /// Ledger rows with no registered unit.
    pub orphaned: Vec<LedgerEntry>,
    /// Current advisory lock holder, when locking is enabled.
    pub lock: Option<LockInfo>,
}

impl StatusReport {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    /// The highest applied id, i.e. the current schema version.
    pub fn current(&self) -> Option<&MigrationId> {
        self.applied.last().map(|m| &m.id)
    }
}
