//! The migration unit contract and its SQL implementation.

use async_trait::async_trait;
use cacophony_core::MigrationId;
use cacophony_db::{DbResult, Store};
use serde::Serialize;
use std::fmt;

/// Whether a unit's `down` undoes its `up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reversibility {
    /// `down` restores the prior schema structure
    Reversible,
    /// `down` is a documented no-op (lossy data rewrite)
    Irreversible,
}

impl fmt::Display for Reversibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reversibility::Reversible => write!(f, "reversible"),
            Reversibility::Irreversible => write!(f, "irreversible"),
        }
    }
}

/// One ordered schema or data change.
///
/// `up` is never invoked twice for an id the ledger already records. After
/// `up` then `down`, the schema structure must match what it was before `up`;
/// data may not, for units marked [`Reversibility::Irreversible`].
#[async_trait]
pub trait MigrationUnit: Send + Sync {
    /// Unique, timestamp-prefixed id. Determines execution order.
    fn id(&self) -> &MigrationId;

    /// Short human description shown by `migrate status`
    fn description(&self) -> &str {
        ""
    }

    /// Whether `down` actually reverses `up`
    fn reversibility(&self) -> Reversibility {
        Reversibility::Reversible
    }

    /// Whether the unit may run inside a transaction together with its
    /// ledger update
    fn transactional(&self) -> bool {
        true
    }

    /// Apply the change
    async fn up(&self, store: &dyn Store) -> DbResult<()>;

    /// Reverse the change
    async fn down(&self, store: &dyn Store) -> DbResult<()>;
}

/// A unit made of raw SQL batches.
///
/// A missing `down` batch marks the unit irreversible; reverting it runs
/// nothing and only clears the ledger entry.
#[derive(Debug, Clone)]
pub struct SqlMigration {
    id: MigrationId,
    description: String,
    up: String,
    down: Option<String>,
    transactional: bool,
}

impl SqlMigration {
    /// Create an irreversible unit from its `up` SQL.
    pub fn new(id: MigrationId, up: impl Into<String>) -> Self {
        Self {
            id,
            description: String::new(),
            up: up.into(),
            down: None,
            transactional: true,
        }
    }

    /// Attach the SQL that reverses `up`.
    pub fn with_down(mut self, down: impl Into<String>) -> Self {
        self.down = Some(down.into());
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Run outside a transaction even when the store supports transactional DDL.
    pub fn non_transactional(mut self) -> Self {
        self.transactional = false;
        self
    }
}

#[async_trait]
impl MigrationUnit for SqlMigration {
    fn id(&self) -> &MigrationId {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn reversibility(&self) -> Reversibility {
        match self.down {
            Some(_) => Reversibility::Reversible,
            None => Reversibility::Irreversible,
        }
    }

    fn transactional(&self) -> bool {
        self.transactional
    }

    async fn up(&self, store: &dyn Store) -> DbResult<()> {
        store.execute_batch(&self.up).await
    }

    async fn down(&self, store: &dyn Store) -> DbResult<()> {
        match &self.down {
            Some(sql) => store.execute_batch(sql).await,
            None => Ok(()),
        }
    }
}
