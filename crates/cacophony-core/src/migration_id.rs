//! Strongly-typed migration identifier.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Minimum number of leading ASCII digits (the authoring timestamp).
pub const MIN_TIMESTAMP_DIGITS: usize = 8;

/// Identifier of a migration unit, e.g. `20230615021417-add-device-heartbeat`.
///
/// Ids sort lexically; the timestamp prefix makes that equal to authoring
/// order. The derived `Ord` is the execution order used by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    /// Parse and validate a migration id.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        validate(&id)?;
        Ok(Self(id))
    }

    /// Create a new `MigrationId`, panicking if the id is malformed.
    ///
    /// Prefer [`parse`](Self::parse) when handling untrusted input.
    pub fn new(id: impl Into<String>) -> Self {
        match Self::parse(id) {
            Ok(id) => id,
            Err(e) => panic!("{e}"),
        }
    }

    /// The leading timestamp digits of the id.
    pub fn timestamp_prefix(&self) -> &str {
        let end = self
            .0
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Return the underlying id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(id: &str) -> CoreResult<()> {
    let invalid = |reason: &str| CoreError::InvalidMigrationId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("id must not be empty"));
    }
    let digits = id.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits < MIN_TIMESTAMP_DIGITS {
        return Err(invalid(&format!(
            "id must start with a timestamp of at least {MIN_TIMESTAMP_DIGITS} digits"
        )));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(invalid(&format!("unexpected character '{bad}'")));
    }
    Ok(())
}

impl<'de> Deserialize<'de> for MigrationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MigrationId::parse(s).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for MigrationId {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MigrationId {
    type Error = CoreError;

    fn try_from(s: String) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for MigrationId {
    type Error = CoreError;

    fn try_from(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "migration_id_test.rs"]
mod tests;
