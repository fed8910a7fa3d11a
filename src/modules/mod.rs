//! Feature modules and the manager that loads them.
//!
//! Core modules always load. Optional modules load when named in
//! `ENABLED_MODULES`, or all of them when the variable is unset. Each module
//! contributes a router fragment and may subscribe event listeners.

mod core_modules;
mod optional_modules;

use axum::Router;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::services::Services;

pub use core_modules::{
    ErrorHandlingModule, LanguageModule, MonitoringModule, SecurityModule, TemplateModule,
    UserModule,
};
pub use optional_modules::{BlogModule, DocsModule, ThemeModule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Core,
    Optional,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModuleError {
    #[error("Unknown module '{0}'")]
    Unknown(String),

    #[error("Module '{module}' requires '{dependency}', which is not loaded")]
    MissingDependency { module: String, dependency: String },
}

pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> ModuleKind;

    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    /// Router fragment; `state` is available for route layers
    fn routes(&self, _state: &AppState) -> Router<AppState> {
        Router::new()
    }

    fn register_listeners(&self, _services: &Services) {}
}

/// Loaded module as reported by `/_status`
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ModuleDescriptor {
    pub name: String,
    pub kind: ModuleKind,
    pub depends_on: Vec<String>,
}

/// Every module the application knows, core first
pub fn catalog() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(ErrorHandlingModule),
        Box::new(SecurityModule),
        Box::new(UserModule),
        Box::new(MonitoringModule),
        Box::new(LanguageModule),
        Box::new(TemplateModule),
        Box::new(BlogModule),
        Box::new(DocsModule),
        Box::new(ThemeModule),
    ]
}

pub struct ModuleManager {
    modules: Vec<Box<dyn Module>>,
}

impl std::fmt::Debug for ModuleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.modules.iter().map(|m| m.name())).finish()
    }
}

impl ModuleManager {
    pub fn load(enabled: Option<&[String]>) -> Result<Self, ModuleError> {
        Self::load_from(catalog(), enabled)
    }

    /// Core modules in catalog order, then the enabled optional modules in
    /// the order given. Names are case-insensitive and loaded once.
    pub fn load_from(candidates: Vec<Box<dyn Module>>, enabled: Option<&[String]>) -> Result<Self, ModuleError> {
        let (mut loaded, mut optional): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|m| m.kind() == ModuleKind::Core);

        match enabled {
            None => loaded.append(&mut optional),
            Some(names) => {
                for name in names {
                    let wanted = name.trim().to_lowercase();
                    if loaded.iter().any(|m| m.name() == wanted) {
                        continue;
                    }
                    let index = optional
                        .iter()
                        .position(|m| m.name() == wanted)
                        .ok_or_else(|| ModuleError::Unknown(name.clone()))?;
                    loaded.push(optional.remove(index));
                }
            }
        }

        for module in &loaded {
            for dependency in module.depends_on() {
                if !loaded.iter().any(|m| m.name() == *dependency) {
                    return Err(ModuleError::MissingDependency {
                        module: module.name().to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            modules = ?loaded.iter().map(|m| m.name()).collect::<Vec<_>>(),
            "Modules loaded"
        );
        Ok(Self { modules: loaded })
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.name() == name)
    }

    pub fn descriptors(&self) -> Vec<ModuleDescriptor> {
        self.modules
            .iter()
            .map(|m| ModuleDescriptor {
                name: m.name().to_string(),
                kind: m.kind(),
                depends_on: m.depends_on().iter().map(|d| d.to_string()).collect(),
            })
            .collect()
    }

    pub fn routes(&self, state: &AppState) -> Router<AppState> {
        self.modules
            .iter()
            .fold(Router::new(), |router, module| router.merge(module.routes(state)))
    }

    pub fn register_listeners(&self, services: &Services) {
        for module in &self.modules {
            module.register_listeners(services);
        }
    }
}
