//! Modules enabled through `ENABLED_MODULES`.

use axum::Router;

use super::{Module, ModuleKind};
use crate::api::handlers::{blog, docs, theme};
use crate::api::AppState;

pub struct BlogModule;

impl Module for BlogModule {
    fn name(&self) -> &'static str {
        "blog"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Optional
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["template"]
    }

    fn routes(&self, state: &AppState) -> Router<AppState> {
        blog::routes(state)
    }
}

pub struct DocsModule;

impl Module for DocsModule {
    fn name(&self) -> &'static str {
        "docs"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Optional
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["template"]
    }

    fn routes(&self, _state: &AppState) -> Router<AppState> {
        docs::routes()
    }
}

pub struct ThemeModule;

impl Module for ThemeModule {
    fn name(&self) -> &'static str {
        "theme"
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Optional
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["template"]
    }

    fn routes(&self, state: &AppState) -> Router<AppState> {
        theme::routes(state)
    }
}
