//! Runtime context for CLI commands

use anyhow::{Context, Result};
use cacophony_core::{Config, CoreError};
use cacophony_db::{DuckDbStore, Store};
use cacophony_migrate::{catalog, MigrationLock, Runner};
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Loaded configuration plus an open store.
pub(crate) struct RuntimeContext {
    pub config: Config,
    pub store: Arc<dyn Store>,
    /// Path the store was opened from.
    pub database: String,
}

impl RuntimeContext {
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        Self::open(args, false)
    }

    /// Context for commands that only inspect the store. A missing database
    /// file is an error instead of being created.
    pub fn read_only(args: &GlobalArgs) -> Result<Self> {
        Self::open(args, true)
    }

    fn open(args: &GlobalArgs, read_only: bool) -> Result<Self> {
        let config = load_config(args)?;
        let target = Config::resolve_target(args.target.as_deref());
        let database = config
            .resolve_database_path(args.database.as_deref(), target.as_deref())
            .context("Failed to resolve database")?;

        log::debug!(
            "Opening {database} (target: {})",
            target.as_deref().unwrap_or("default")
        );
        let store = if read_only && database != ":memory:" {
            DuckDbStore::open_read_only(Path::new(&database))
        } else {
            DuckDbStore::new(&database)
        };
        let store: Arc<dyn Store> =
            Arc::new(store.with_context(|| format!("Failed to open database {database}"))?);

        Ok(Self {
            config,
            store,
            database,
        })
    }

    /// Runner over the embedded catalog, configured from `migrations:`.
    pub fn runner(&self) -> Result<Runner> {
        let registry = catalog::registry().context("Invalid migration catalog")?;
        Ok(
            Runner::from_config(Arc::clone(&self.store), registry, &self.config.migrations)
                .with_lock_holder(MigrationLock::holder_id(&self.config.name)),
        )
    }

    /// The lock table regardless of whether locking is enabled for runs.
    pub fn lock(&self) -> MigrationLock {
        MigrationLock::new(
            Arc::clone(&self.store),
            self.config.migrations.lock_table.clone(),
        )
    }
}

/// Explicit `--config`, else `./cacophony.yml`, else defaults when
/// `--database` names the store.
fn load_config(args: &GlobalArgs) -> Result<Config> {
    if let Some(path) = &args.config {
        return Config::load(Path::new(path)).context("Failed to load configuration file");
    }
    match Config::load_from_dir(Path::new(".")) {
        Ok(config) => Ok(config),
        Err(CoreError::ConfigNotFound { .. }) if args.database.is_some() => {
            log::debug!("No cacophony.yml found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(e).context("Failed to load configuration (pass --config or --database)"),
    }
}
