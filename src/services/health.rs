//! Health checks and the manager that runs them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::config::{Config, APP_VERSION, DATABASE_DEGRADED_THRESHOLD_MS, MIN_JWT_SECRET_LENGTH};
use crate::domain::{HealthCheckResult, HealthReport, HealthStatus};
use crate::infra::Database;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> HealthCheckResult;
}

/// `SELECT 1` round trip
pub struct DatabaseHealthCheck {
    db: Database,
}

impl DatabaseHealthCheck {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HealthCheck for DatabaseHealthCheck {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let result = self.db.ping().await;
        let latency = started.elapsed().as_millis();

        match result {
            Err(e) => HealthCheckResult::unhealthy("database", format!("Database unreachable: {}", e)),
            Ok(()) if latency > DATABASE_DEGRADED_THRESHOLD_MS => {
                HealthCheckResult::degraded("database", "Database responding slowly")
                    .with_detail("latency_ms", latency as u64)
            }
            Ok(()) => HealthCheckResult::healthy("database", "Database connection OK")
                .with_detail("latency_ms", latency as u64),
        }
    }
}

/// Writable storage and log directories, readable content directories
pub struct FilesystemHealthCheck {
    writable: Vec<PathBuf>,
    readable: Vec<PathBuf>,
}

impl FilesystemHealthCheck {
    pub fn new(writable: Vec<PathBuf>, readable: Vec<PathBuf>) -> Self {
        Self { writable, readable }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            vec![config.storage_path.clone(), config.log_path.clone()],
            vec![config.content_path.clone(), config.docs_path.clone()],
        )
    }
}

fn check_writable(dir: &Path) -> Result<(), String> {
    if !dir.is_dir() {
        return Err("missing".to_string());
    }
    let marker = dir.join(format!(".health-{}", uuid::Uuid::new_v4()));
    std::fs::write(&marker, b"ok").map_err(|e| e.to_string())?;
    std::fs::remove_file(&marker).map_err(|e| e.to_string())
}

#[async_trait]
impl HealthCheck for FilesystemHealthCheck {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn check(&self) -> HealthCheckResult {
        let mut status = HealthStatus::Healthy;
        let mut problems = Vec::new();
        let mut details = serde_json::Map::new();

        for dir in &self.writable {
            let state = match check_writable(dir) {
                Ok(()) => "writable".to_string(),
                Err(e) => {
                    status = HealthStatus::Unhealthy;
                    problems.push(format!("{} not writable", dir.display()));
                    e
                }
            };
            details.insert(dir.display().to_string(), state.into());
        }

        for dir in &self.readable {
            let state = if dir.is_dir() {
                "readable"
            } else {
                status = status.max(HealthStatus::Degraded);
                problems.push(format!("{} missing", dir.display()));
                "missing"
            };
            details.insert(dir.display().to_string(), state.into());
        }

        let message = if problems.is_empty() {
            "All directories accessible".to_string()
        } else {
            problems.join("; ")
        };

        let mut result = match status {
            HealthStatus::Healthy => HealthCheckResult::healthy("filesystem", message),
            HealthStatus::Degraded => HealthCheckResult::degraded("filesystem", message),
            HealthStatus::Unhealthy => HealthCheckResult::unhealthy("filesystem", message),
        };
        result.details = details;
        result
    }
}

/// Configuration sanity and runtime facts
pub struct RuntimeHealthCheck {
    config: Arc<Config>,
}

impl RuntimeHealthCheck {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl HealthCheck for RuntimeHealthCheck {
    fn name(&self) -> &str {
        "runtime"
    }

    async fn check(&self) -> HealthCheckResult {
        let config = &self.config;
        let mut warnings = Vec::new();

        if config.jwt_secret_len() < MIN_JWT_SECRET_LENGTH {
            warnings.push("JWT secret is shorter than recommended".to_string());
        }
        if config.app_env.is_production() && config.debug {
            warnings.push("Debug mode is enabled in production".to_string());
        }
        for (key, path) in [
            ("STORAGE_PATH", &config.storage_path),
            ("LOG_PATH", &config.log_path),
            ("TRANSLATIONS_PATH", &config.translations_path),
            ("THEMES_PATH", &config.themes_path),
        ] {
            if path.as_os_str().is_empty() {
                warnings.push(format!("{} is not configured", key));
            }
        }

        let workers = tokio::runtime::Handle::try_current()
            .map(|h| h.metrics().num_workers())
            .unwrap_or(0);

        let result = if warnings.is_empty() {
            HealthCheckResult::healthy("runtime", "Runtime configuration OK")
        } else {
            HealthCheckResult::degraded("runtime", warnings.join("; "))
        };

        result
            .with_detail("environment", config.app_env.as_str())
            .with_detail("debug", config.debug)
            .with_detail("version", APP_VERSION)
            .with_detail("tokio_workers", workers)
    }
}

/// Runs every registered check concurrently
pub struct HealthCheckManager {
    checks: Vec<Arc<dyn HealthCheck>>,
    environment: String,
    started_at: DateTime<Utc>,
}

impl HealthCheckManager {
    pub fn new(environment: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            checks: Vec::new(),
            environment: environment.into(),
            started_at,
        }
    }

    pub fn register(&mut self, check: Arc<dyn HealthCheck>) {
        self.checks.push(check);
    }

    pub fn names(&self) -> Vec<String> {
        self.checks.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    async fn timed(check: &Arc<dyn HealthCheck>) -> HealthCheckResult {
        let started = Instant::now();
        let result = check.check().await;
        let elapsed = started.elapsed().as_millis() as u64;
        if result.status != HealthStatus::Healthy {
            tracing::warn!(check = check.name(), status = result.status.as_str(), "{}", result.message);
        }
        result.with_duration(elapsed)
    }

    /// Overall status is the worst individual status
    pub async fn check_all(&self) -> HealthReport {
        let checks = join_all(self.checks.iter().map(Self::timed)).await;
        HealthReport {
            status: HealthStatus::worst(checks.iter().map(|c| c.status)),
            timestamp: Utc::now(),
            version: APP_VERSION.to_string(),
            environment: self.environment.clone(),
            uptime_seconds: self.uptime_seconds(),
            checks,
        }
    }

    pub async fn check(&self, name: &str) -> Option<HealthCheckResult> {
        let check = self.checks.iter().find(|c| c.name() == name)?;
        Some(Self::timed(check).await)
    }
}
