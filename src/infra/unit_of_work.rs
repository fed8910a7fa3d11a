//! Unit of Work: one handle over every repository.
//!
//! Services take an `Arc<dyn UnitOfWork>` instead of individual stores, so
//! the composition root decides which implementations back them.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::repositories::{
    LoginAttemptRepository, LoginAttemptStore, RevokedTokenRepository, RevokedTokenStore,
    SessionRepository, SessionStore, UserRepository, UserStore,
};

/// Centralized repository access for dependency injection.
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn login_attempts(&self) -> Arc<dyn LoginAttemptRepository>;

    fn sessions(&self) -> Arc<dyn SessionRepository>;

    fn revoked_tokens(&self) -> Arc<dyn RevokedTokenRepository>;
}

/// SeaORM-backed UnitOfWork
pub struct Persistence {
    users: Arc<dyn UserRepository>,
    login_attempts: Arc<dyn LoginAttemptRepository>,
    sessions: Arc<dyn SessionRepository>,
    revoked_tokens: Arc<dyn RevokedTokenRepository>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            login_attempts: Arc::new(LoginAttemptStore::new(db.clone())),
            sessions: Arc::new(SessionStore::new(db.clone())),
            revoked_tokens: Arc::new(RevokedTokenStore::new(db)),
        }
    }

    /// Assemble from arbitrary implementations (mocks in tests)
    pub fn from_parts(
        users: Arc<dyn UserRepository>,
        login_attempts: Arc<dyn LoginAttemptRepository>,
        sessions: Arc<dyn SessionRepository>,
        revoked_tokens: Arc<dyn RevokedTokenRepository>,
    ) -> Self {
        Self {
            users,
            login_attempts,
            sessions,
            revoked_tokens,
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn login_attempts(&self) -> Arc<dyn LoginAttemptRepository> {
        self.login_attempts.clone()
    }

    fn sessions(&self) -> Arc<dyn SessionRepository> {
        self.sessions.clone()
    }

    fn revoked_tokens(&self) -> Arc<dyn RevokedTokenRepository> {
        self.revoked_tokens.clone()
    }
}
