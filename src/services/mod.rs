//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion; `container::Services` wires the concrete graph.

mod auth_service;
pub mod authorization;
mod blog_service;
pub mod container;
pub mod csrf;
mod docs_service;
pub mod events;
pub mod health;
pub mod i18n;
pub mod jwt;
pub mod metrics;
mod session_service;
pub mod templates;
pub mod theme;
pub mod throttle;
mod user_service;

// Service Container
pub use container::{CleanupReport, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator, TokenResponse};
pub use authorization::{authorize, authorize_self_or};
pub use blog_service::{render_markdown, ArticleQuery, BlogManager, BlogService, NewArticle, TermCount};
pub use csrf::CsrfService;
pub use docs_service::{DocEntry, DocPage, DocsService};
pub use events::{AuditLogListener, EventDispatcher, EventListener, SecurityMetricsListener, ALL_EVENTS};
pub use health::{HealthCheck, HealthCheckManager};
pub use i18n::Translator;
pub use jwt::JwtService;
pub use metrics::{MetricSummary, PerformanceMonitor};
pub use session_service::SessionService;
pub use templates::TemplateRenderer;
pub use theme::{ThemeInfo, ThemeManager};
pub use throttle::LoginThrottle;
pub use user_service::{NewUser, UserChanges, UserManager, UserService, UserStatistics};
