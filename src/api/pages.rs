//! Server-rendered page helpers.
//!
//! Every page shares the layout context: locale, application name, version,
//! active theme, the signed-in user and the session CSRF token.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::{json, Map, Value};

use super::session::{current_session, session_user};
use super::AppState;
use crate::config::APP_VERSION;
use crate::domain::{Session, User, UserResponse};
use crate::errors::{AppError, AppResult};

/// Layout data for one request
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub locale: String,
    pub user: Option<User>,
    pub csrf_token: Option<String>,
}

impl PageContext {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session: Option<&Session>, user: Option<User>) -> Self {
        self.csrf_token = session.map(|s| s.csrf_token.clone());
        self.user = user;
        self
    }

    pub fn t(&self, state: &AppState, key: &str) -> String {
        state.services.translator().translate(key, &self.locale, &[])
    }

    fn data(&self, state: &AppState, page: Value) -> Value {
        let mut data = Map::new();
        data.insert("locale".into(), json!(self.locale));
        data.insert("app_name".into(), json!(state.config.app_name));
        data.insert("version".into(), json!(APP_VERSION));
        let theme = state.services.themes().active_id();
        if !theme.is_empty() {
            data.insert("theme".into(), json!(theme));
        }
        if let Some(user) = &self.user {
            data.insert("user".into(), json!(UserResponse::from(user.clone())));
        }
        if let Some(token) = &self.csrf_token {
            data.insert("csrf_token".into(), json!(token));
        }
        if let Value::Object(page) = page {
            data.extend(page);
        }
        Value::Object(data)
    }
}

/// Render `template` with the layout context merged under `page`.
pub fn render(state: &AppState, ctx: &PageContext, template: &str, status: StatusCode, page: Value) -> Response {
    match state.services.templates().render(template, &ctx.data(state, page)) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(template, error = %e, "Page rendering failed");
            e.into_response()
        }
    }
}

/// HTML error page for `err`; internal details only show in debug mode.
pub fn error_page(state: &AppState, ctx: &PageContext, err: AppError) -> Response {
    let problem = err.to_problem();
    let status = problem.status_code();

    let mut detail = problem.detail;
    if let Some(internal) = err.internal_detail() {
        tracing::error!(error = %internal, "Page request failed");
        if state.config.debug {
            detail = Some(internal);
        }
    }

    render(
        state,
        ctx,
        "error",
        status,
        json!({
            "title": problem.title,
            "status": status.as_u16(),
            "detail": detail,
        }),
    )
}

impl PageContext {
    /// Context for a visitor that may or may not be signed in. Never starts a
    /// session.
    pub async fn load(state: &AppState, jar: &CookieJar, locale: impl Into<String>) -> AppResult<Self> {
        let session = current_session(state, jar).await?;
        let user = match &session {
            Some(session) => session_user(state, session).await?,
            None => None,
        };
        Ok(Self::new(locale).with_session(session.as_ref(), user))
    }
}
