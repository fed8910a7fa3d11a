//! Modules that always load.

use std::sync::Arc;

use axum::Router;

use super::{Module, ModuleKind};
use crate::api::handlers::{auth, health, language, users, web};
use crate::api::AppState;
use crate::services::{AuditLogListener, SecurityMetricsListener, Services, ALL_EVENTS};

/// Problem Details rendering; its middleware and fallback are global
pub struct ErrorHandlingModule;

impl Module for ErrorHandlingModule {
    fn name(&self) -> &'static str {
        "error_handling"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Core
    }
}

/// API tokens, web login sessions and CSRF
pub struct SecurityModule;

impl Module for SecurityModule {
    fn name(&self) -> &'static str {
        "security"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Core
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["user", "template"]
    }

    fn routes(&self, state: &AppState) -> Router<AppState> {
        Router::new()
            .nest("/api/auth", auth::routes(state))
            .merge(web::routes())
    }

    fn register_listeners(&self, services: &Services) {
        services
            .events()
            .subscribe(ALL_EVENTS, Arc::new(AuditLogListener));
    }
}

pub struct UserModule;

impl Module for UserModule {
    fn name(&self) -> &'static str {
        "user"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Core
    }

    fn routes(&self, state: &AppState) -> Router<AppState> {
        Router::new().nest("/api/users", users::routes(state))
    }
}

/// Health checks, status page and metrics
pub struct MonitoringModule;

impl Module for MonitoringModule {
    fn name(&self) -> &'static str {
        "monitoring"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Core
    }

    fn routes(&self, state: &AppState) -> Router<AppState> {
        health::routes(state)
    }

    fn register_listeners(&self, services: &Services) {
        services.events().subscribe(
            ALL_EVENTS,
            Arc::new(SecurityMetricsListener::new(services.monitor())),
        );
    }
}

pub struct LanguageModule;

impl Module for LanguageModule {
    fn name(&self) -> &'static str {
        "language"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Core
    }

    fn routes(&self, _state: &AppState) -> Router<AppState> {
        Router::new().nest("/api/language", language::routes())
    }
}

/// Handlebars rendering; other modules render through it
pub struct TemplateModule;

impl Module for TemplateModule {
    fn name(&self) -> &'static str {
        "template"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Core
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["language"]
    }
}
