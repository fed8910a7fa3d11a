//! Application state shared by every handler.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::modules::ModuleManager;
use crate::services::Services;

/// Cheap to clone; everything lives behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Database,
    pub services: Arc<Services>,
    pub modules: Arc<ModuleManager>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the service graph, load modules and subscribe their listeners.
    pub fn build(config: Config, database: Database) -> AppResult<Self> {
        let started_at = Utc::now();
        let config = Arc::new(config);
        let services = Services::build(config.clone(), &database, started_at)?;

        let modules = ModuleManager::load(config.enabled_modules.as_deref())
            .map_err(|e| AppError::internal(e.to_string()))?;
        modules.register_listeners(&services);

        Ok(Self {
            config,
            database,
            services: Arc::new(services),
            modules: Arc::new(modules),
            started_at,
        })
    }
}
