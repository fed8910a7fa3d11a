//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections, migrations and repositories
//! - Markdown content on disk
//! - Unit of Work aggregating the repositories

pub mod content;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use content::{ArticleRepository, Document, DocumentStore, DocumentSummary, MarkdownArticleStore};
pub use db::{Database, Migrator};
pub use repositories::{
    LoginAttemptRepository, LoginAttemptStore, RevokedTokenRepository, RevokedTokenStore,
    SessionRepository, SessionStore, UserRepository, UserStore,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use content::MockArticleRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockLoginAttemptRepository, MockRevokedTokenRepository, MockSessionRepository,
    MockUserRepository,
};
