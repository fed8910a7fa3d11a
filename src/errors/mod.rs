//! Centralized error handling.
//!
//! Provides a unified error type for the entire application. Every variant
//! renders as an RFC 7807 Problem Details document; the catch-all middleware
//! in [`middleware`] turns everything else the framework produces into one.

pub mod middleware;
mod problem;

use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub use middleware::{handle_panic, not_found_fallback, problem_details_middleware};
pub use problem::{ProblemDetails, PROBLEM_JSON};

/// Validation messages keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("Account is not active")]
    AccountInactive,

    #[error("CSRF token missing or invalid")]
    CsrfMismatch,

    #[error("Too many attempts, retry in {retry_after} seconds")]
    TooManyRequests { retry_after: u64 },

    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Validation
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // External service errors
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Internal error text attached to 5xx responses; exposed only in debug mode.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl AppError {
    /// Problem type slug
    pub fn slug(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidCredentials => "invalid-credentials",
            AppError::Forbidden(_) => "forbidden",
            AppError::AccountInactive => "account-inactive",
            AppError::CsrfMismatch => "csrf-token-mismatch",
            AppError::TooManyRequests { .. } => "too-many-requests",
            AppError::NotFound(_) => "not-found",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation-error",
            AppError::BadRequest(_) => "bad-request",
            AppError::Database(_) => "database-error",
            AppError::Jwt(_) => "invalid-token",
            AppError::Io(_) | AppError::Template(_) | AppError::Internal(_) => "internal-error",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) | AppError::AccountInactive | AppError::CsrfMismatch => {
                StatusCode::FORBIDDEN
            }
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Template(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Jwt(_) => "Invalid or expired token".to_string(),
            AppError::Io(_) | AppError::Template(_) | AppError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            AppError::Validation(_) => "One or more fields are invalid".to_string(),
            _ => self.to_string(),
        }
    }

    /// Full internal description, logged and shown only in debug mode.
    pub fn internal_detail(&self) -> Option<String> {
        match self {
            AppError::Database(e) => Some(format!("Database error: {}", e)),
            AppError::Io(e) => Some(format!("I/O error: {}", e)),
            AppError::Template(msg) => Some(format!("Template error: {}", msg)),
            AppError::Internal(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Convert into a Problem Details document.
    pub fn to_problem(&self) -> ProblemDetails {
        let status = self.status();
        let title = status.canonical_reason().unwrap_or("Error");
        let mut problem = ProblemDetails::new(status, self.slug(), title).with_detail(self.user_message());

        match self {
            AppError::Validation(errors) => {
                problem = problem.with_extension(
                    "errors",
                    serde_json::to_value(errors).unwrap_or_default(),
                );
            }
            AppError::TooManyRequests { retry_after } => {
                problem = problem.with_extension("retry_after", *retry_after);
            }
            _ => {}
        }

        problem
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Jwt(e) = &self {
            tracing::debug!("JWT rejected: {:?}", e);
        }

        let internal = self.internal_detail();
        if let Some(detail) = &internal {
            tracing::error!(error = %detail, "Request failed with internal error");
        }

        let mut response = self.to_problem().into_response();

        if let AppError::TooManyRequests { retry_after } = &self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        if let Some(detail) = internal {
            response.extensions_mut().insert(InternalErrorDetail(detail));
        }

        response
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(entity.to_string()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        AppError::NotFound(entity.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    /// Validation error for a single field.
    pub fn field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![msg.into()]);
        AppError::Validation(errors)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl From<handlebars::RenderError> for AppError {
    fn from(e: handlebars::RenderError) -> Self {
        AppError::Template(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::Validation(fields)
    }
}
