//! RFC 7807 Problem Details documents.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PROBLEM_TYPE_BASE;

/// Media type for problem documents
pub const PROBLEM_JSON: &str = "application/problem+json";

/// A Problem Details object (RFC 7807).
///
/// Extension members are flattened into the top-level JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl ProblemDetails {
    /// Create a problem with a slug resolved against the problem type base URI.
    pub fn new(status: StatusCode, slug: &str, title: impl Into<String>) -> Self {
        Self {
            problem_type: format!("{}{}", PROBLEM_TYPE_BASE, slug),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            extensions: Map::new(),
        }
    }

    /// Generic problem for a bare status code.
    pub fn from_status(status: StatusCode) -> Self {
        let title = status.canonical_reason().unwrap_or("Error");
        let slug = title.to_ascii_lowercase().replace(' ', "-");
        Self::new(status, &slug, title)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match serde_json::to_vec(&self) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Problem serialization failed: {}", e);
                br#"{"type":"about:blank","title":"Internal Server Error","status":500}"#.to_vec()
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_rfc7807_members() {
        let problem = ProblemDetails::new(StatusCode::NOT_FOUND, "not-found", "Not Found")
            .with_detail("User not found")
            .with_instance("/api/users/1");

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["type"], "https://hdm-boot.dev/problems/not-found");
        assert_eq!(json["title"], "Not Found");
        assert_eq!(json["status"], 404);
        assert_eq!(json["detail"], "User not found");
        assert_eq!(json["instance"], "/api/users/1");
    }

    #[test]
    fn test_extensions_are_flattened() {
        let problem = ProblemDetails::new(StatusCode::TOO_MANY_REQUESTS, "too-many-requests", "Too Many Requests")
            .with_extension("retry_after", 60);

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["retry_after"], 60);
        assert!(json.get("extensions").is_none());
    }

    #[test]
    fn test_from_status_uses_canonical_reason() {
        let problem = ProblemDetails::from_status(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(problem.title, "Method Not Allowed");
        assert!(problem.problem_type.ends_with("method-not-allowed"));
    }

    #[test]
    fn test_response_has_problem_content_type() {
        let response = ProblemDetails::from_status(StatusCode::CONFLICT).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROBLEM_JSON
        );
    }

    #[test]
    fn test_round_trip_keeps_extensions() {
        let problem = ProblemDetails::from_status(StatusCode::UNPROCESSABLE_ENTITY)
            .with_extension("errors", serde_json::json!({"email": ["Invalid email format"]}));
        let text = serde_json::to_string(&problem).unwrap();
        let parsed: ProblemDetails = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, problem);
    }
}
