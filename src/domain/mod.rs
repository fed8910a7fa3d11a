//! Domain layer - Core business entities and logic
//!
//! Entities, value objects and domain rules, independent of HTTP and storage.

pub mod article;
pub mod events;
pub mod health;
pub mod password;
pub mod permission;
pub mod session;
pub mod token;
pub mod user;

pub use article::{Article, ArticleDetail, ArticleSummary};
pub use events::{DomainEvent, EventEnvelope};
pub use health::{HealthCheckResult, HealthReport, HealthStatus};
pub use password::Password;
pub use permission::Permission;
pub use session::Session;
pub use token::{Claims, JwtToken};
pub use user::{User, UserResponse, UserRole, UserStatus};
