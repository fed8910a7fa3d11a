//! API layer - HTTP handlers and middleware
//!
//! This module contains all HTTP-related concerns:
//! - Request handlers, grouped by feature
//! - Middleware (authentication, request metrics)
//! - Custom extractors
//! - Session cookies and page rendering for the HTML routes
//! - Route assembly

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod pages;
pub mod routes;
pub mod session;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
