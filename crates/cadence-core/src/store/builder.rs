//! Builder for creating and configuring PlanStore instances.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::task;

use super::{persister::PersisterConfig, PlanStore, StoreState};
use crate::{
    db::Database,
    error::{CadenceError, Result},
    generator::{GeneratorConfig, PlanGenerator},
};

/// Quiet period before pending mutations are written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Builder for creating and configuring PlanStore instances.
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    database_path: Option<PathBuf>,
    debounce: Duration,
    in_memory: bool,
    generator: GeneratorConfig,
}

impl StoreBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            database_path: None,
            debounce: DEFAULT_DEBOUNCE,
            in_memory: false,
            generator: GeneratorConfig::default(),
        }
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/cadence/cadence.db` or `~/.local/share/cadence/cadence.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets how long mutations must be quiet before they are written.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Keeps all state in memory; nothing is loaded or persisted.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn with_generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator = config;
        self
    }

    /// Builds the store, loading any persisted plans and schedule.
    ///
    /// # Errors
    ///
    /// Returns `CadenceError::FileSystem` if the database directory cannot be created
    /// Returns `CadenceError::Database` if database initialization fails
    pub async fn build(self) -> Result<PlanStore> {
        let generator = PlanGenerator::new(self.generator);
        if self.in_memory {
            return Ok(PlanStore::new(StoreState::default(), generator, None));
        }

        let db_path = if let Some(path) = self.database_path {
            path
        } else {
            Self::default_database_path()?
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CadenceError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let load_path = db_path.clone();
        let (plans, schedule) = task::spawn_blocking(move || {
            let db = Database::new(&load_path)?;
            Ok::<_, CadenceError>((db.load_plans()?, db.load_schedule()?))
        })
        .await
        .map_err(CadenceError::join)??;

        let state = StoreState::loaded(plans, schedule);
        let store = PlanStore::new(
            state,
            generator,
            Some(PersisterConfig {
                db_path,
                debounce: self.debounce,
            }),
        );
        store.reconcile().await;
        Ok(store)
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("cadence")
            .place_data_file("cadence.db")
            .map_err(|e| CadenceError::XdgDirectory(e.to_string()))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
