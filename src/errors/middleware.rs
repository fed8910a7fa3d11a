//! Catch-all error middleware.
//!
//! Guarantees that every error response leaving the application is a Problem
//! Details document, whatever produced it: handlers returning [`AppError`],
//! framework rejections (unknown route, wrong method, malformed bodies) or a
//! panic caught by `CatchPanicLayer`.

use std::any::Any;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AppError, InternalErrorDetail, ProblemDetails, PROBLEM_JSON};
use crate::api::AppState;
use crate::config::MAX_ERROR_BODY_BYTES;

/// Rewrite error responses into Problem Details.
///
/// HTML error pages and plain JSON bodies (e.g. a 503 health report) pass
/// through untouched.
pub async fn problem_details_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let is_problem = content_type.starts_with(PROBLEM_JSON);
    let is_bare = content_type.is_empty() || content_type.starts_with("text/plain");
    if !is_problem && !is_bare {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES)
        .await
        .unwrap_or_default();

    let mut problem = if is_problem {
        serde_json::from_slice::<ProblemDetails>(&bytes)
            .unwrap_or_else(|_| ProblemDetails::from_status(status))
    } else {
        let text = String::from_utf8_lossy(&bytes).trim().to_string();
        let problem = ProblemDetails::from_status(status);
        if !text.is_empty() && status.is_client_error() {
            problem.with_detail(text)
        } else {
            problem
        }
    };

    if problem.instance.is_none() {
        problem.instance = Some(path);
    }

    if state.config.debug {
        if let Some(InternalErrorDetail(detail)) = parts.extensions.get::<InternalErrorDetail>() {
            problem.detail = Some(detail.clone());
        }
    }

    let body = match serde_json::to_vec(&problem) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Problem serialization failed: {}", e);
            return AppError::internal("problem serialization failed").into_response();
        }
    };

    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON));

    Response::from_parts(parts, Body::from(body))
}

/// Fallback for unmatched routes.
pub async fn not_found_fallback(uri: Uri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}

/// Convert a caught panic into a 500 problem.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %message, "Request handler panicked");
    AppError::internal(format!("Handler panicked: {}", message)).into_response()
}
