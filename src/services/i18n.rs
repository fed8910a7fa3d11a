//! Translation catalogs and locale negotiation.
//!
//! Catalogs are JSON files named `<locale>.json`. Nested objects are
//! flattened to dotted keys, so `{"auth": {"login": "Log in"}}` is looked up
//! as `auth.login`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde_json::Value;

use crate::config::Config;
use crate::errors::{AppError, AppResult};

pub type Catalog = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct Translator {
    default_locale: String,
    supported: Vec<String>,
    catalogs: HashMap<String, Catalog>,
}

impl Translator {
    pub fn new(default_locale: impl Into<String>, supported: Vec<String>, catalogs: HashMap<String, Catalog>) -> Self {
        Self {
            default_locale: default_locale.into(),
            supported,
            catalogs,
        }
    }

    /// Read `<dir>/<locale>.json` for every supported locale. Missing files
    /// yield empty catalogs; malformed ones are an error.
    pub fn load(dir: &Path, default_locale: &str, supported: &[String]) -> AppResult<Self> {
        let mut catalogs = HashMap::new();
        for locale in supported {
            let file = dir.join(format!("{}.json", locale));
            let raw = match std::fs::read_to_string(&file) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(locale = %locale, "No translation catalog at {}", file.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let value: Value = serde_json::from_str(&raw).map_err(|e| {
                AppError::internal(format!("Invalid catalog {}: {}", file.display(), e))
            })?;
            let catalog = flatten(&value);
            tracing::debug!(locale = %locale, keys = catalog.len(), "Translation catalog loaded");
            catalogs.insert(locale.clone(), catalog);
        }
        Ok(Self::new(default_locale, supported.to_vec(), catalogs))
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::load(
            &config.translations_path,
            &config.default_locale,
            &config.supported_locales,
        )
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn supported_locales(&self) -> &[String] {
        &self.supported
    }

    pub fn is_supported(&self, locale: &str) -> bool {
        self.supported.iter().any(|l| l == locale)
    }

    pub fn catalog(&self, locale: &str) -> Option<&Catalog> {
        if !self.is_supported(locale) {
            return None;
        }
        self.catalogs.get(locale).or(Some(&EMPTY))
    }

    /// Message for `key`, falling back to the default locale and then to the
    /// key itself. `{name}` placeholders are replaced from `params`.
    pub fn translate(&self, key: &str, locale: &str, params: &[(&str, &str)]) -> String {
        let message = self
            .catalogs
            .get(locale)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(&self.default_locale).and_then(|c| c.get(key)))
            .map(String::as_str)
            .unwrap_or(key);

        params.iter().fold(message.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }

    /// Locale from explicit choices in priority order, then `Accept-Language`,
    /// then the default.
    pub fn resolve(&self, query: Option<&str>, cookie: Option<&str>, accept_language: Option<&str>) -> String {
        [query, cookie]
            .into_iter()
            .flatten()
            .map(|l| l.trim().to_lowercase())
            .find(|l| self.is_supported(l))
            .or_else(|| accept_language.and_then(|h| self.negotiate(h)))
            .unwrap_or_else(|| self.default_locale.clone())
    }

    /// Best supported locale in an `Accept-Language` header. Region subtags
    /// match on their base language (`sk-SK` selects `sk`).
    pub fn negotiate(&self, header: &str) -> Option<String> {
        let mut ranges: Vec<(String, f32)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.trim().split(';');
                let tag = pieces.next()?.trim().to_lowercase();
                if tag.is_empty() {
                    return None;
                }
                let quality = pieces
                    .filter_map(|p| p.trim().strip_prefix("q="))
                    .find_map(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((tag, quality))
            })
            .filter(|(_, q)| *q > 0.0)
            .collect();
        // Stable sort keeps header order among equal weights.
        ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        ranges.into_iter().find_map(|(tag, _)| {
            if self.is_supported(&tag) {
                return Some(tag);
            }
            let base = tag.split(['-', '_']).next()?;
            self.is_supported(base).then(|| base.to_string())
        })
    }
}

static EMPTY: Catalog = BTreeMap::new();

fn flatten(value: &Value) -> Catalog {
    let mut out = Catalog::new();
    flatten_into(&mut out, String::new(), value);
    out
}

fn flatten_into(out: &mut Catalog, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(out, path, child);
            }
        }
        Value::String(s) => {
            out.insert(prefix, s.clone());
        }
        Value::Null => {}
        other => {
            out.insert(prefix, other.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> Translator {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("en.json"),
            r#"{"auth": {"login": "Log in", "welcome": "Welcome, {name}!"}, "only_en": "English"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("sk.json"), r#"{"auth": {"login": "Prihlásiť"}}"#).unwrap();

        let supported = vec!["en".to_string(), "sk".to_string(), "cs".to_string()];
        Translator::load(dir.path(), "en", &supported).unwrap()
    }

    #[test]
    fn test_translate_fallbacks() {
        let t = translator();
        assert_eq!(t.translate("auth.login", "sk", &[]), "Prihlásiť");
        assert_eq!(t.translate("only_en", "sk", &[]), "English");
        assert_eq!(t.translate("only_en", "cs", &[]), "English");
        assert_eq!(t.translate("missing.key", "sk", &[]), "missing.key");
    }

    #[test]
    fn test_translate_params() {
        let t = translator();
        assert_eq!(
            t.translate("auth.welcome", "en", &[("name", "Ada")]),
            "Welcome, Ada!"
        );
    }

    #[test]
    fn test_catalog_for_supported_only() {
        let t = translator();
        assert_eq!(t.catalog("sk").unwrap().len(), 1);
        assert!(t.catalog("cs").unwrap().is_empty());
        assert!(t.catalog("de").is_none());
    }

    #[test]
    fn test_negotiate() {
        let t = translator();
        assert_eq!(t.negotiate("de-DE,sk-SK;q=0.8,en;q=0.5").as_deref(), Some("sk"));
        assert_eq!(t.negotiate("en;q=0.2, cs;q=0.9").as_deref(), Some("cs"));
        assert_eq!(t.negotiate("sk;q=0").as_deref(), None);
        assert_eq!(t.negotiate("fr").as_deref(), None);
    }

    #[test]
    fn test_resolve_priority() {
        let t = translator();
        assert_eq!(t.resolve(Some("cs"), Some("sk"), Some("en")), "cs");
        assert_eq!(t.resolve(Some("xx"), Some("sk"), None), "sk");
        assert_eq!(t.resolve(None, None, Some("sk")), "sk");
        assert_eq!(t.resolve(None, None, None), "en");
    }
}
