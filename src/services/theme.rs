//! Theme discovery and activation.
//!
//! A theme is a directory under the themes root holding `theme.json`, an
//! optional `templates/` directory of overrides and an optional `assets/`
//! directory served as static files.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::authorization::authorize;
use super::templates::TemplateRenderer;
use crate::config::Config;
use crate::domain::{Permission, User};
use crate::errors::{AppError, AppResult, OptionExt};

const MANIFEST: &str = "theme.json";
const TEMPLATES_DIR: &str = "templates";
const ASSETS_DIR: &str = "assets";

#[derive(Debug, Deserialize)]
struct Manifest {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

/// Installed theme
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ThemeInfo {
    /// Directory name, used in URLs and configuration
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub has_templates: bool,
    pub has_assets: bool,
}

pub struct ThemeManager {
    root: PathBuf,
    active: RwLock<String>,
    renderer: Arc<TemplateRenderer>,
}

impl ThemeManager {
    pub fn new(root: impl Into<PathBuf>, renderer: Arc<TemplateRenderer>) -> Self {
        Self {
            root: root.into(),
            active: RwLock::new(String::new()),
            renderer,
        }
    }

    /// Manager with the configured theme applied. A missing theme leaves the
    /// built-in templates in use.
    pub fn from_config(config: &Config, renderer: Arc<TemplateRenderer>) -> AppResult<Self> {
        let manager = Self::new(&config.themes_path, renderer);
        match manager.find(&config.active_theme)? {
            Some(theme) => manager.apply(&theme)?,
            None => tracing::warn!(
                theme = %config.active_theme,
                "Configured theme not found, using built-in templates"
            ),
        }
        Ok(manager)
    }

    pub fn list(&self) -> AppResult<Vec<ThemeInfo>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut themes = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            match self.load(&id) {
                Ok(Some(theme)) => themes.push(theme),
                Ok(None) => {}
                Err(e) => tracing::warn!(theme = %id, error = %e, "Skipping unreadable theme"),
            }
        }
        themes.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(themes)
    }

    pub fn find(&self, id: &str) -> AppResult<Option<ThemeInfo>> {
        if !is_safe_segment(id) {
            return Ok(None);
        }
        self.load(id)
    }

    /// Id of the active theme; empty while built-ins are in use
    pub fn active_id(&self) -> String {
        self.active.read().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn active(&self) -> AppResult<Option<ThemeInfo>> {
        let id = self.active_id();
        if id.is_empty() {
            return Ok(None);
        }
        self.find(&id)
    }

    /// `theme.manage`
    pub fn activate(&self, actor: &User, id: &str) -> AppResult<ThemeInfo> {
        authorize(actor, Permission::ThemeManage)?;
        let theme = self.find(id)?.ok_or_not_found("Theme")?;
        self.apply(&theme)?;
        tracing::info!(theme = %theme.id, activated_by = %actor.id, "Theme activated");
        Ok(theme)
    }

    /// File under a theme's `assets/`; traversal attempts yield `None`.
    pub fn asset_path(&self, theme: &str, path: &str) -> Option<PathBuf> {
        if !is_safe_segment(theme) {
            return None;
        }
        let relative = Path::new(path.trim_start_matches('/'));
        if path.is_empty()
            || path.contains('\\')
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        let full = self.root.join(theme).join(ASSETS_DIR).join(relative);
        full.is_file().then_some(full)
    }

    fn apply(&self, theme: &ThemeInfo) -> AppResult<()> {
        let templates = self.root.join(&theme.id).join(TEMPLATES_DIR);
        self.renderer.apply_overrides(Some(&templates))?;
        let mut active = self
            .active
            .write()
            .map_err(|_| AppError::internal("Theme lock poisoned"))?;
        *active = theme.id.clone();
        Ok(())
    }

    fn load(&self, id: &str) -> AppResult<Option<ThemeInfo>> {
        let dir = self.root.join(id);
        if !dir.is_dir() {
            return Ok(None);
        }
        let raw = match std::fs::read_to_string(dir.join(MANIFEST)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let manifest: Manifest = serde_json::from_str(&raw)
            .map_err(|e| AppError::internal(format!("Invalid {} for theme '{}': {}", MANIFEST, id, e)))?;

        Ok(Some(ThemeInfo {
            id: id.to_string(),
            name: manifest.name,
            version: manifest.version,
            description: manifest.description,
            author: manifest.author,
            has_templates: dir.join(TEMPLATES_DIR).is_dir(),
            has_assets: dir.join(ASSETS_DIR).is_dir(),
        }))
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::services::i18n::Translator;
    use serde_json::json;
    use std::collections::HashMap;

    fn setup() -> (tempfile::TempDir, ThemeManager) {
        let dir = tempfile::tempdir().unwrap();
        let dark = dir.path().join("dark");
        std::fs::create_dir_all(dark.join("templates")).unwrap();
        std::fs::create_dir_all(dark.join("assets/css")).unwrap();
        std::fs::write(
            dark.join("theme.json"),
            r#"{"name": "Dark", "version": "1.0.0", "author": "HDM"}"#,
        )
        .unwrap();
        std::fs::write(dark.join("templates/error.hbs"), "dark {{status}}").unwrap();
        std::fs::write(dark.join("assets/css/style.css"), "body{}").unwrap();

        std::fs::create_dir_all(dir.path().join("plain")).unwrap();
        std::fs::write(dir.path().join("plain/theme.json"), r#"{"name": "Plain"}"#).unwrap();
        std::fs::create_dir_all(dir.path().join("not-a-theme")).unwrap();

        let translator = Arc::new(Translator::new("en", vec!["en".into()], HashMap::new()));
        let renderer = Arc::new(TemplateRenderer::new(translator).unwrap());
        let manager = ThemeManager::new(dir.path(), renderer);
        (dir, manager)
    }

    fn admin() -> User {
        User::new("a@x.cz".into(), "h".into(), "Admin".into(), UserRole::Admin)
    }

    #[test]
    fn test_list_only_manifests() {
        let (_dir, themes) = setup();
        let list = themes.list().unwrap();
        let ids: Vec<_> = list.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["dark", "plain"]);
        assert!(list[0].has_templates && list[0].has_assets);
        assert!(!list[1].has_templates);
    }

    #[test]
    fn test_activate_applies_overrides() {
        let (_dir, themes) = setup();
        assert!(themes.active().unwrap().is_none());

        let theme = themes.activate(&admin(), "dark").unwrap();
        assert_eq!(theme.name, "Dark");
        assert_eq!(themes.active_id(), "dark");
        let html = themes.renderer.render("error", &json!({"status": 500})).unwrap();
        assert_eq!(html, "dark 500");

        themes.activate(&admin(), "plain").unwrap();
        let html = themes.renderer.render("error", &json!({"status": 500})).unwrap();
        assert!(html.contains("<!DOCTYPE html>"));
    }

    #[test]
    fn test_activate_rules() {
        let (_dir, themes) = setup();
        let editor = User::new("e@x.cz".into(), "h".into(), "Ed".into(), UserRole::Editor);
        assert!(matches!(themes.activate(&editor, "dark"), Err(AppError::Forbidden(_))));
        assert!(matches!(themes.activate(&admin(), "missing"), Err(AppError::NotFound(_))));
        assert!(matches!(themes.activate(&admin(), "../dark"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_asset_path() {
        let (_dir, themes) = setup();
        assert!(themes.asset_path("dark", "css/style.css").is_some());
        assert!(themes.asset_path("dark", "../theme.json").is_none());
        assert!(themes.asset_path("dark", "missing.css").is_none());
        assert!(themes.asset_path("..", "dark/theme.json").is_none());
    }
}
