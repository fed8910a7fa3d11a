//! Server-side web sessions.
//!
//! Guest sessions carry a CSRF token for anonymous visitors. Logging in
//! rotates the session id so a pre-login id can never be reused.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::csrf::{random_token, CsrfService};
use crate::config::{Config, SESSION_ID_BYTES};
use crate::domain::Session;
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

pub struct SessionService<U: UnitOfWork> {
    uow: Arc<U>,
    csrf: CsrfService,
    lifetime_seconds: i64,
}

impl<U: UnitOfWork> SessionService<U> {
    pub fn new(uow: Arc<U>, csrf: CsrfService, lifetime_seconds: i64) -> Self {
        Self {
            uow,
            csrf,
            lifetime_seconds,
        }
    }

    pub fn from_config(uow: Arc<U>, config: &Config) -> Self {
        Self::new(uow, CsrfService::default(), config.session_lifetime_seconds)
    }

    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime_seconds
    }

    /// New guest session
    pub async fn start(&self, ip_address: Option<String>, user_agent: Option<String>) -> AppResult<Session> {
        let session = Session::new(
            random_token(SESSION_ID_BYTES),
            self.csrf.generate_token(),
            self.lifetime_seconds,
            ip_address,
            user_agent,
        );
        self.uow.sessions().save(session.clone()).await?;
        Ok(session)
    }

    /// Live session by id; expired sessions are deleted and reported absent.
    pub async fn load(&self, id: &str) -> AppResult<Option<Session>> {
        let Some(mut session) = self.uow.sessions().find(id).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            self.uow.sessions().delete(id).await?;
            return Ok(None);
        }

        session.touch(self.lifetime_seconds);
        self.uow.sessions().save(session.clone()).await?;
        Ok(Some(session))
    }

    /// Existing live session or a fresh guest one; the flag is true when created.
    pub async fn load_or_start(
        &self,
        id: Option<&str>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> AppResult<(Session, bool)> {
        if let Some(id) = id {
            if let Some(session) = self.load(id).await? {
                return Ok((session, false));
            }
        }
        Ok((self.start(ip_address, user_agent).await?, true))
    }

    /// Bind a user to a brand-new session, discarding the previous one.
    pub async fn rotate_for_user(
        &self,
        previous: Option<&Session>,
        user_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> AppResult<Session> {
        if let Some(previous) = previous {
            self.uow.sessions().delete(&previous.id).await?;
        }
        let mut session = self.start(ip_address, user_agent).await?;
        session.user_id = Some(user_id);
        self.uow.sessions().save(session.clone()).await?;
        Ok(session)
    }

    pub async fn destroy(&self, id: &str) -> AppResult<()> {
        self.uow.sessions().delete(id).await
    }

    pub async fn destroy_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        self.uow.sessions().delete_for_user(user_id).await
    }

    pub async fn cleanup(&self) -> AppResult<u64> {
        self.uow.sessions().delete_expired(Utc::now()).await
    }

    pub fn verify_csrf(&self, session: &Session, provided: Option<&str>) -> AppResult<()> {
        self.csrf.verify(provided, &session.csrf_token)
    }
}
