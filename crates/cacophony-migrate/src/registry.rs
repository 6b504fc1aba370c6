//! Ordered, validated catalog of migration units.

use cacophony_core::MigrationId;

use crate::error::{MigrateError, MigrateResult};
use crate::unit::MigrationUnit;

/// All known migration units, sorted by id ascending.
///
/// Built once at startup and handed to the runner; registration order does
/// not matter, only ids do.
pub struct Registry {
    units: Vec<Box<dyn MigrationUnit>>,
}

impl Registry {
    /// Sort `units` by id and reject duplicates.
    pub fn new(mut units: Vec<Box<dyn MigrationUnit>>) -> MigrateResult<Self> {
        units.sort_by(|a, b| a.id().cmp(b.id()));
        if let Some(pair) = units.windows(2).find(|w| w[0].id() == w[1].id()) {
            return Err(MigrateError::DuplicateId {
                id: pair[0].id().clone(),
            });
        }
        Ok(Self { units })
    }

    /// Units in execution order.
    pub fn list(&self) -> impl DoubleEndedIterator<Item = &dyn MigrationUnit> + '_ {
        self.units.iter().map(|u| u.as_ref())
    }

    /// Ids in execution order.
    pub fn ids(&self) -> impl Iterator<Item = &MigrationId> + '_ {
        self.units.iter().map(|u| u.id())
    }

    /// Look up a unit by id.
    pub fn get(&self, id: &str) -> Option<&dyn MigrationUnit> {
        self.units
            .binary_search_by(|u| u.id().as_str().cmp(id))
            .ok()
            .map(|idx| self.units[idx].as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
