//! Application settings loaded from environment variables.

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use thiserror::Error;

use super::constants::*;

/// Configuration errors raised at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable must be set in production")]
    MissingJwtSecret,

    #[error("JWT_SECRET must be at least {0} characters long")]
    WeakJwtSecret(usize),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("DEFAULT_LOCALE '{0}' is not listed in SUPPORTED_LOCALES")]
    UnsupportedDefaultLocale(String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Testing,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "testing" | "test" => Ok(Self::Testing),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ConfigError::InvalidValue {
                key: "APP_ENV",
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for AppEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub app_name: String,
    pub app_env: AppEnv,
    pub debug: bool,
    pub database_url: String,
    jwt_secret: String,
    pub jwt_expiry_seconds: i64,
    pub jwt_issuer: String,
    pub server_host: String,
    pub server_port: u16,
    pub session_lifetime_seconds: i64,
    pub session_cookie: String,
    pub session_secure: bool,
    pub login_max_attempts: u64,
    pub login_max_ip_attempts: u64,
    pub login_lockout_minutes: i64,
    /// `None` enables every optional module
    pub enabled_modules: Option<Vec<String>>,
    pub default_locale: String,
    pub supported_locales: Vec<String>,
    pub translations_path: PathBuf,
    pub themes_path: PathBuf,
    pub active_theme: String,
    pub content_path: PathBuf,
    pub docs_path: PathBuf,
    pub storage_path: PathBuf,
    pub log_path: PathBuf,
    pub slow_request_ms: u64,
    /// Peers whose `X-Forwarded-For` / `X-Real-IP` headers are believed
    pub trusted_proxies: Vec<IpAddr>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app_name", &self.app_name)
            .field("app_env", &self.app_env)
            .field("debug", &self.debug)
            .field("database_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_seconds", &self.jwt_expiry_seconds)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("enabled_modules", &self.enabled_modules)
            .field("default_locale", &self.default_locale)
            .field("active_theme", &self.active_theme)
            .field("trusted_proxies", &self.trusted_proxies)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Tests use this to inject values without mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_env = match get("APP_ENV") {
            Some(v) => AppEnv::parse(&v)?,
            None => AppEnv::Development,
        };

        let debug = match get("APP_DEBUG") {
            Some(v) => parse_bool("APP_DEBUG", &v)?,
            None => !app_env.is_production(),
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if app_env.is_production() => return Err(ConfigError::MissingJwtSecret),
            None => {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                DEV_JWT_SECRET.to_string()
            }
        };
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::WeakJwtSecret(MIN_JWT_SECRET_LENGTH));
        }

        let supported_locales = get("SUPPORTED_LOCALES")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| DEFAULT_SUPPORTED_LOCALES.iter().map(|s| s.to_string()).collect());
        let default_locale = get("DEFAULT_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        if !supported_locales.contains(&default_locale) {
            return Err(ConfigError::UnsupportedDefaultLocale(default_locale));
        }

        let path = |key: &str, default: &str| PathBuf::from(get(key).unwrap_or_else(|| default.to_string()));

        Ok(Self {
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            app_env,
            debug,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            jwt_expiry_seconds: parse_or(&get, "JWT_EXPIRY", DEFAULT_JWT_EXPIRY_SECONDS)?,
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
            server_host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_or(&get, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            session_lifetime_seconds: parse_or(
                &get,
                "SESSION_LIFETIME",
                DEFAULT_SESSION_LIFETIME_SECONDS,
            )?,
            session_cookie: get("SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
            session_secure: match get("SESSION_SECURE") {
                Some(v) => parse_bool("SESSION_SECURE", &v)?,
                None => app_env.is_production(),
            },
            login_max_attempts: parse_or(&get, "LOGIN_MAX_ATTEMPTS", DEFAULT_LOGIN_MAX_ATTEMPTS)?,
            login_max_ip_attempts: parse_or(
                &get,
                "LOGIN_MAX_IP_ATTEMPTS",
                DEFAULT_LOGIN_MAX_IP_ATTEMPTS,
            )?,
            login_lockout_minutes: parse_or(
                &get,
                "LOGIN_LOCKOUT_MINUTES",
                DEFAULT_LOGIN_LOCKOUT_MINUTES,
            )?,
            enabled_modules: get("ENABLED_MODULES").map(|v| split_list(&v)),
            default_locale,
            supported_locales,
            translations_path: path("TRANSLATIONS_PATH", DEFAULT_TRANSLATIONS_PATH),
            themes_path: path("THEMES_PATH", DEFAULT_THEMES_PATH),
            active_theme: get("ACTIVE_THEME").unwrap_or_else(|| DEFAULT_THEME.to_string()),
            content_path: path("CONTENT_PATH", DEFAULT_CONTENT_PATH),
            docs_path: path("DOCS_PATH", DEFAULT_DOCS_PATH),
            storage_path: path("STORAGE_PATH", DEFAULT_STORAGE_PATH),
            log_path: path("LOG_PATH", DEFAULT_LOG_PATH),
            slow_request_ms: parse_or(&get, "SLOW_REQUEST_MS", DEFAULT_SLOW_REQUEST_MS)?,
            trusted_proxies: match get("TRUSTED_PROXIES") {
                Some(v) => parse_ip_list("TRUSTED_PROXIES", &v)?,
                None => Vec::new(),
            },
        })
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Length of the configured secret, for health reporting.
    pub fn jwt_secret_len(&self) -> usize {
        self.jwt_secret.len()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_ip_list(key: &'static str, value: &str) -> Result<Vec<IpAddr>, ConfigError> {
    split_list(value)
        .into_iter()
        .map(|ip| ip.parse().map_err(|_| ConfigError::InvalidValue { key, value: ip }))
        .collect()
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
