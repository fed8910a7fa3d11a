//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

pub(crate) mod entities;
mod login_attempt_repository;
mod revoked_token_repository;
mod session_repository;
mod user_repository;

pub use login_attempt_repository::{LoginAttemptRepository, LoginAttemptStore};
pub use revoked_token_repository::{RevokedTokenRepository, RevokedTokenStore};
pub use session_repository::{SessionRepository, SessionStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use login_attempt_repository::MockLoginAttemptRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use revoked_token_repository::MockRevokedTokenRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use session_repository::MockSessionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
