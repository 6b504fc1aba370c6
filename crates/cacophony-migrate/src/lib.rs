//! Schema migration runner for Cacophony.
//!
//! Applies an ordered catalog of migration units to a [`Store`] exactly once
//! each, records them in a ledger table inside the same store, and reverses
//! the most recently applied units on request. Runs are serialized across
//! processes by a single-row advisory lock table.
//!
//! [`Store`]: cacophony_db::Store

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod registry;
pub mod runner;
pub mod status;
pub mod unit;

pub use error::{MigrateError, MigrateResult};
pub use ledger::{Ledger, LedgerEntry};
pub use lock::{LockInfo, MigrationLock};
pub use registry::Registry;
pub use runner::{Direction, RunReport, Runner, UnitFailure};
pub use status::{AppliedMigration, PendingMigration, StatusReport};
pub use unit::{MigrationUnit, Reversibility, SqlMigration};
