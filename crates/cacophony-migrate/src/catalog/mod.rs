//! Embedded schema migrations for the Cacophony API database.
//!
//! Each migration is a pair of `.sql` files embedded via `include_str!`.
//! A missing `down` file marks the migration irreversible. [`MIGRATIONS`]
//! is consumed by [`registry`], which validates ids and ordering before
//! anything runs.

use cacophony_core::MigrationId;

use crate::error::{MigrateError, MigrateResult};
use crate::registry::Registry;
use crate::unit::{MigrationUnit, SqlMigration};

/// A single embedded migration.
pub struct CatalogEntry {
    /// Timestamp-prefixed id.
    pub id: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Forward SQL.
    pub up: &'static str,
    /// Reverse SQL; `None` when the change cannot be undone.
    pub down: Option<&'static str>,
}

/// All embedded migrations.
pub static MIGRATIONS: &[CatalogEntry] = &[
    CatalogEntry {
        id: "20190603000000-create-device-groups",
        description: "Create device groups",
        up: include_str!("20190603000000-create-device-groups.up.sql"),
        down: Some(include_str!("20190603000000-create-device-groups.down.sql")),
    },
    CatalogEntry {
        id: "20190603000100-create-devices",
        description: "Create devices",
        up: include_str!("20190603000100-create-devices.up.sql"),
        down: Some(include_str!("20190603000100-create-devices.down.sql")),
    },
    CatalogEntry {
        id: "20190604000000-create-recordings",
        description: "Create recordings",
        up: include_str!("20190604000000-create-recordings.up.sql"),
        down: Some(include_str!("20190604000000-create-recordings.down.sql")),
    },
    CatalogEntry {
        id: "20190604000100-create-tracks-and-tags",
        description: "Create tracks and track tags",
        up: include_str!("20190604000100-create-tracks-and-tags.up.sql"),
        down: Some(include_str!("20190604000100-create-tracks-and-tags.down.sql")),
    },
    CatalogEntry {
        id: "20200212000000-create-stations",
        description: "Create stations and link recordings to them",
        up: include_str!("20200212000000-create-stations.up.sql"),
        down: Some(include_str!("20200212000000-create-stations.down.sql")),
    },
    CatalogEntry {
        id: "20210817000000-create-alerts",
        description: "Create animal detection alerts",
        up: include_str!("20210817000000-create-alerts.up.sql"),
        down: Some(include_str!("20210817000000-create-alerts.down.sql")),
    },
    CatalogEntry {
        id: "20230615021417-add-device-heartbeat",
        description: "Add device heartbeat columns",
        up: include_str!("20230615021417-add-device-heartbeat.up.sql"),
        down: Some(include_str!("20230615021417-add-device-heartbeat.down.sql")),
    },
    CatalogEntry {
        id: "20231030000000-rename-unknown-tags",
        description: "Rename human 'unknown' tags to 'unidentified'",
        up: include_str!("20231030000000-rename-unknown-tags.up.sql"),
        down: None,
    },
    CatalogEntry {
        id: "20240212000000-add-track-tag-model",
        description: "Record which classifier model produced automatic tags",
        up: include_str!("20240212000000-add-track-tag-model.up.sql"),
        down: Some(include_str!("20240212000000-add-track-tag-model.down.sql")),
    },
    CatalogEntry {
        id: "20240501000000-add-recording-processing-index",
        description: "Index recordings by processing state",
        up: include_str!("20240501000000-add-recording-processing-index.up.sql"),
        down: Some(include_str!(
            "20240501000000-add-recording-processing-index.down.sql"
        )),
    },
];

impl CatalogEntry {
    /// Build the runnable unit, validating the id.
    pub fn to_unit(&self) -> MigrateResult<SqlMigration> {
        let id = MigrationId::parse(self.id).map_err(MigrateError::InvalidId)?;
        let unit = SqlMigration::new(id, self.up).with_description(self.description);
        Ok(match self.down {
            Some(down) => unit.with_down(down),
            None => unit,
        })
    }
}

/// Validated units for every embedded migration.
pub fn units() -> MigrateResult<Vec<Box<dyn MigrationUnit>>> {
    MIGRATIONS
        .iter()
        .map(|entry| Ok(Box::new(entry.to_unit()?) as Box<dyn MigrationUnit>))
        .collect()
}

/// Registry of every embedded migration.
pub fn registry() -> MigrateResult<Registry> {
    Registry::new(units()?)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
