//! Service Container - the composition root.
//!
//! `Services::build` is the single place where concrete implementations are
//! chosen: repositories into the unit of work, the unit of work into the
//! services, and everything behind `Arc` so handlers share one instance.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::auth_service::{AuthService, Authenticator};
use super::blog_service::{BlogManager, BlogService};
use super::docs_service::DocsService;
use super::events::EventDispatcher;
use super::health::{DatabaseHealthCheck, FilesystemHealthCheck, HealthCheckManager, RuntimeHealthCheck};
use super::i18n::Translator;
use super::jwt::JwtService;
use super::metrics::PerformanceMonitor;
use super::session_service::SessionService;
use super::templates::TemplateRenderer;
use super::theme::ThemeManager;
use super::throttle::LoginThrottle;
use super::user_service::{UserManager, UserService};
use crate::config::{Config, LOGIN_ATTEMPT_RETENTION_HOURS};
use crate::errors::AppResult;
use crate::infra::{Database, DocumentStore, MarkdownArticleStore, Persistence, UnitOfWork};

/// Rows removed by a maintenance run
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct CleanupReport {
    pub sessions: u64,
    pub revoked_tokens: u64,
    pub login_attempts: u64,
}

/// Concrete service graph shared by every handler
pub struct Services {
    config: Arc<Config>,
    uow: Arc<Persistence>,
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    blog_service: Arc<dyn BlogService>,
    docs_service: Arc<DocsService>,
    session_service: Arc<SessionService<Persistence>>,
    throttle: LoginThrottle<Persistence>,
    translator: Arc<Translator>,
    templates: Arc<TemplateRenderer>,
    themes: Arc<ThemeManager>,
    events: Arc<EventDispatcher>,
    monitor: Arc<PerformanceMonitor>,
    health: Arc<HealthCheckManager>,
}

impl Services {
    /// Wire every service from configuration and an open database.
    pub fn build(config: Arc<Config>, db: &Database, started_at: DateTime<Utc>) -> AppResult<Self> {
        for dir in [&config.storage_path, &config.log_path] {
            std::fs::create_dir_all(dir)?;
        }

        let uow = Arc::new(Persistence::new(db.get_connection()));
        let events = Arc::new(EventDispatcher::new());
        let monitor = Arc::new(PerformanceMonitor::new(&config.log_path));

        let auth_service: Arc<dyn AuthService> = Arc::new(Authenticator::new(
            uow.clone(),
            JwtService::from_config(&config),
            LoginThrottle::from_config(uow.clone(), &config),
            events.clone(),
        ));
        let user_service: Arc<dyn UserService> = Arc::new(UserManager::new(uow.clone(), events.clone()));
        let session_service = Arc::new(SessionService::from_config(uow.clone(), &config));

        let blog_service: Arc<dyn BlogService> = Arc::new(BlogManager::new(Arc::new(
            MarkdownArticleStore::new(&config.content_path),
        )));
        let docs_service = Arc::new(DocsService::new(DocumentStore::new(&config.docs_path)));

        let translator = Arc::new(Translator::from_config(&config)?);
        let templates = Arc::new(TemplateRenderer::new(translator.clone())?);
        let themes = Arc::new(ThemeManager::from_config(&config, templates.clone())?);

        let mut health = HealthCheckManager::new(config.app_env.as_str(), started_at);
        health.register(Arc::new(DatabaseHealthCheck::new(db.clone())));
        health.register(Arc::new(FilesystemHealthCheck::from_config(&config)));
        health.register(Arc::new(RuntimeHealthCheck::new(config.clone())));

        tracing::debug!(checks = ?health.names(), "Service container built");

        Ok(Self {
            throttle: LoginThrottle::from_config(uow.clone(), &config),
            config,
            uow,
            auth_service,
            user_service,
            blog_service,
            docs_service,
            session_service,
            translator,
            templates,
            themes,
            events,
            monitor,
            health: Arc::new(health),
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    pub fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    pub fn blog(&self) -> Arc<dyn BlogService> {
        self.blog_service.clone()
    }

    pub fn docs(&self) -> Arc<DocsService> {
        self.docs_service.clone()
    }

    pub fn sessions(&self) -> Arc<SessionService<Persistence>> {
        self.session_service.clone()
    }

    pub fn translator(&self) -> Arc<Translator> {
        self.translator.clone()
    }

    pub fn templates(&self) -> Arc<TemplateRenderer> {
        self.templates.clone()
    }

    pub fn themes(&self) -> Arc<ThemeManager> {
        self.themes.clone()
    }

    pub fn events(&self) -> Arc<EventDispatcher> {
        self.events.clone()
    }

    pub fn monitor(&self) -> Arc<PerformanceMonitor> {
        self.monitor.clone()
    }

    pub fn health(&self) -> Arc<HealthCheckManager> {
        self.health.clone()
    }

    /// Prune expired sessions and revoked tokens plus stale login attempts.
    pub async fn cleanup(&self) -> AppResult<CleanupReport> {
        let now = Utc::now();
        let revoked_repo = self.uow.revoked_tokens();
        let (sessions, revoked_tokens, login_attempts) = futures::try_join!(
            self.session_service.cleanup(),
            revoked_repo.delete_expired(now),
            self.throttle.cleanup(Duration::hours(LOGIN_ATTEMPT_RETENTION_HOURS)),
        )?;

        let report = CleanupReport {
            sessions,
            revoked_tokens,
            login_attempts,
        };
        tracing::info!(?report, "Maintenance cleanup finished");
        Ok(report)
    }
}
