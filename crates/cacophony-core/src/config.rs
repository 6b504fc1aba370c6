//! Configuration types and parsing for cacophony.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Config file names searched for in a directory, in priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &["cacophony.yml", "cacophony.yaml"];

/// Environment variable consulted when no `--target` flag is given.
pub const TARGET_ENV_VAR: &str = "CACOPHONY_TARGET";

/// Main configuration from cacophony.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Deployment name, used in log output and as the lock holder prefix
    #[serde(default = "default_name")]
    pub name: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Ledger and lock table settings
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Named target configurations (e.g., dev, test, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Ledger and advisory lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Table recording applied migration ids
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Single-row table used as the advisory lock
    #[serde(default = "default_lock_table")]
    pub lock_table: String,

    /// Acquire the advisory lock around `up` and `down`
    #[serde(default = "default_true")]
    pub lock: bool,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            ledger_table: default_ledger_table(),
            lock_table: default_lock_table(),
            lock: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            database: DatabaseConfig::default(),
            migrations: MigrationsConfig::default(),
            targets: HashMap::new(),
        }
    }
}

fn default_name() -> String {
    "cacophony".to_string()
}

fn default_db_path() -> String {
    "cacophony.duckdb".to_string()
}

fn default_ledger_table() -> String {
    "schema_migrations".to_string()
}

fn default_lock_table() -> String {
    "schema_migrations_lock".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for cacophony.yml or cacophony.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "name cannot be empty".to_string(),
            });
        }

        validate_table_name("migrations.ledger_table", &self.migrations.ledger_table)?;
        validate_table_name("migrations.lock_table", &self.migrations.lock_table)?;
        if self.migrations.ledger_table == self.migrations.lock_table {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.ledger_table and migrations.lock_table must differ"
                    .to_string(),
            });
        }

        let databases = std::iter::once(("database", &self.database)).chain(
            self.targets
                .iter()
                .filter_map(|(name, t)| t.database.as_ref().map(|db| (name.as_str(), db))),
        );
        for (owner, db) in databases {
            if db.path.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("database path for '{owner}' cannot be empty"),
                });
            }
        }

        Ok(())
    }

    /// Get the list of available target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get database configuration, optionally applying target overrides
    ///
    /// If target is specified and exists, uses target's database config.
    /// Otherwise, uses the base database config.
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config =
                    self.targets
                        .get(name)
                        .ok_or_else(|| CoreError::TargetNotFound {
                            name: name.to_string(),
                            available: self.available_targets().join(", "),
                        })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Resolve the database path to open.
    ///
    /// Priority: explicit override > target database > base database
    pub fn resolve_database_path(
        &self,
        override_path: Option<&str>,
        target: Option<&str>,
    ) -> CoreResult<String> {
        if let Some(path) = override_path {
            return Ok(path.to_string());
        }
        Ok(self.get_database_config(target)?.path)
    }

    /// Resolve target from CLI flag or CACOPHONY_TARGET environment variable
    ///
    /// Priority: CLI flag > CACOPHONY_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are allowed.
fn validate_table_name(field: &str, name: &str) -> CoreResult<()> {
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::ConfigInvalid {
            message: format!(
                "{field} '{name}' must be a plain identifier (letters, digits, underscores)"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
