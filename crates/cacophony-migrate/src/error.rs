//! Error types for the migration runner.

use cacophony_core::{CoreError, MigrationId};
use cacophony_db::DbError;
use thiserror::Error;

use crate::runner::Direction;

/// Migration runner errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Two registered units share an id (M001).
    #[error("[M001] Duplicate migration id: {id}")]
    DuplicateId { id: MigrationId },

    /// A catalog entry carries a malformed id (M002).
    #[error("[M002] Invalid migration id: {0}")]
    InvalidId(#[source] CoreError),

    /// `migrate up --to` named an id that is not registered (M003).
    #[error("[M003] Unknown target migration: {id}")]
    UnknownTarget { id: String },

    /// Statement failure inside a unit or a ledger/lock query (M004).
    #[error("[M004] Store error: {0}")]
    Store(#[from] DbError),

    /// The ledger already records this id (M005).
    #[error("[M005] Migration {id} is already recorded as applied")]
    DuplicateApply { id: String },

    /// The ledger has no row for this id (M006).
    #[error("[M006] Migration {id} is not recorded as applied")]
    NotApplied { id: String },

    /// Another runner holds the advisory lock (M007).
    #[error("[M007] Migration lock is held by '{holder}' since {since}. If no migration is running, clear it with `migrate unlock`")]
    LockHeld { holder: String, since: String },

    /// `revert` was asked to reverse zero units (M008).
    #[error("[M008] Revert count must be at least 1")]
    InvalidCount,

    /// A unit failed mid-run; earlier units in the run stay applied (M009).
    #[error("[M009] Migration {id} failed ({direction}) after {} completed unit(s): {source}", .completed.len())]
    UnitFailed {
        id: MigrationId,
        direction: Direction,
        completed: Vec<MigrationId>,
        #[source]
        source: Box<MigrateError>,
    },
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
