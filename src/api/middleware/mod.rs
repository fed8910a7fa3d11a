//! API middleware.

mod auth;
mod metrics;

pub use auth::{auth_middleware, CurrentUser};
pub use metrics::request_metrics_middleware;
