//! HTML rendering with Handlebars.
//!
//! Built-in templates are compiled into the binary. A theme may override any
//! of them with `templates/<name>.hbs`; `layout` is registered as a partial so
//! pages wrap themselves with `{{#> layout}}...{{/layout}}`.

use std::path::Path;
use std::sync::{Arc, RwLock};

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderErrorReason,
};
use serde::Serialize;

use super::i18n::Translator;
use crate::errors::{AppError, AppResult};

pub const LAYOUT: &str = "layout";

pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (LAYOUT, include_str!("../../resources/templates/layout.hbs")),
    ("login", include_str!("../../resources/templates/login.hbs")),
    ("profile", include_str!("../../resources/templates/profile.hbs")),
    ("blog_index", include_str!("../../resources/templates/blog_index.hbs")),
    ("blog_article", include_str!("../../resources/templates/blog_article.hbs")),
    ("docs_index", include_str!("../../resources/templates/docs_index.hbs")),
    ("docs_page", include_str!("../../resources/templates/docs_page.hbs")),
    ("error", include_str!("../../resources/templates/error.hbs")),
];

const TEMPLATE_EXTENSION: &str = "hbs";

/// `{{t "key" name=value}}`, translated into the `locale` of the root context.
struct TranslateHelper {
    translator: Arc<Translator>,
}

impl HelperDef for TranslateHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let key = h
            .param(0)
            .and_then(|p| p.value().as_str())
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("t", 0))?;
        let locale = ctx
            .data()
            .get("locale")
            .and_then(|l| l.as_str())
            .unwrap_or_else(|| self.translator.default_locale());

        let params: Vec<(&str, String)> = h
            .hash()
            .iter()
            .map(|(name, value)| {
                let text = match value.value() {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (*name, text)
            })
            .collect();
        let borrowed: Vec<(&str, &str)> = params.iter().map(|(n, v)| (*n, v.as_str())).collect();

        let text = self.translator.translate(key, locale, &borrowed);
        out.write(&handlebars::html_escape(&text))?;
        Ok(())
    }
}

pub struct TemplateRenderer {
    registry: RwLock<Handlebars<'static>>,
    translator: Arc<Translator>,
}

impl TemplateRenderer {
    pub fn new(translator: Arc<Translator>) -> AppResult<Self> {
        let registry = build_registry(&translator, None)?;
        Ok(Self {
            registry: RwLock::new(registry),
            translator,
        })
    }

    pub fn translator(&self) -> &Arc<Translator> {
        &self.translator
    }

    /// Rebuild the registry from built-ins plus the overrides in `dir`.
    /// On error the current templates stay in place.
    pub fn apply_overrides(&self, dir: Option<&Path>) -> AppResult<()> {
        let registry = build_registry(&self.translator, dir)?;
        let mut current = self
            .registry
            .write()
            .map_err(|_| AppError::internal("Template registry lock poisoned"))?;
        *current = registry;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.registry
            .read()
            .map(|r| r.has_template(name))
            .unwrap_or(false)
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> AppResult<String> {
        let registry = self
            .registry
            .read()
            .map_err(|_| AppError::internal("Template registry lock poisoned"))?;
        Ok(registry.render(name, data)?)
    }
}

fn build_registry(translator: &Arc<Translator>, overrides: Option<&Path>) -> AppResult<Handlebars<'static>> {
    let mut registry = Handlebars::new();
    registry.register_helper(
        "t",
        Box::new(TranslateHelper {
            translator: translator.clone(),
        }),
    );

    for (name, source) in BUILTIN_TEMPLATES {
        register(&mut registry, name, source)?;
    }

    if let Some(dir) = overrides.filter(|d| d.is_dir()) {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)?;
            register(&mut registry, name, &source)?;
            tracing::debug!(template = name, "Theme template override registered");
        }
    }

    Ok(registry)
}

fn register(registry: &mut Handlebars<'static>, name: &str, source: &str) -> AppResult<()> {
    let result = if name == LAYOUT {
        registry.register_partial(name, source)
    } else {
        registry.register_template_string(name, source)
    };
    result.map_err(|e| AppError::Template(format!("{}: {}", name, e)))
}
