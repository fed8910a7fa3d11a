//! Server-rendered login, logout and profile pages.

use axum::{
    extract::State,
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::extractors::{ClientInfo, Locale};
use crate::api::pages::{error_page, render, PageContext};
use crate::api::session::{clear_session_cookie, current_session, ensure_session, session_cookie, session_user};
use crate::api::AppState;
use crate::config::CSRF_HEADER;
use crate::domain::DomainEvent;
use crate::errors::{AppError, AppResult};

/// Login form fields
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutForm {
    #[serde(default)]
    pub csrf_token: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok())
}

/// GET /login
async fn login_page(
    State(state): State<AppState>,
    Locale(locale): Locale,
    client: ClientInfo,
    jar: CookieJar,
) -> Response {
    let ctx = PageContext::new(locale);
    let (session, jar) = match ensure_session(&state, jar, &client).await {
        Ok(pair) => pair,
        Err(e) => return error_page(&state, &ctx, e),
    };

    match session_user(&state, &session).await {
        Ok(Some(_)) => (jar, Redirect::to("/profile")).into_response(),
        Ok(None) => {
            let ctx = ctx.with_session(Some(&session), None);
            (jar, login_form(&state, &ctx, "", None)).into_response()
        }
        Err(e) => error_page(&state, &ctx, e),
    }
}

/// POST /login
async fn login_submit(
    State(state): State<AppState>,
    Locale(locale): Locale,
    client: ClientInfo,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let ctx = PageContext::new(locale);
    let (session, jar) = match ensure_session(&state, jar, &client).await {
        Ok(pair) => pair,
        Err(e) => return error_page(&state, &ctx, e),
    };
    let ctx = ctx.with_session(Some(&session), None);

    let provided = form.csrf_token.as_deref().or_else(|| header_token(&headers));
    if let Err(e) = state.services.sessions().verify_csrf(&session, provided) {
        return (jar, login_form(&state, &ctx, &form.email, Some(e))).into_response();
    }

    if let Err(e) = form.validate() {
        return (jar, login_form(&state, &ctx, &form.email, Some(e.into()))).into_response();
    }

    let user = match state
        .services
        .auth()
        .authenticate(&form.email, &form.password, client.ip_address.as_deref())
        .await
    {
        Ok(user) => user,
        Err(e) => return (jar, login_form(&state, &ctx, &form.email, Some(e))).into_response(),
    };

    let rotated = state
        .services
        .sessions()
        .rotate_for_user(Some(&session), user.id, client.ip_address, client.user_agent)
        .await;
    match rotated {
        Ok(session) => {
            let jar = jar.add(session_cookie(&state.config, &session.id));
            (jar, Redirect::to("/profile")).into_response()
        }
        Err(e) => error_page(&state, &ctx, e),
    }
}

/// Login form, with a translated message and matching status for `error`.
fn login_form(state: &AppState, ctx: &PageContext, email: &str, error: Option<AppError>) -> Response {
    let translator = state.services.translator();
    let title = ctx.t(state, "auth.login_title");
    let Some(error) = error else {
        return render(state, ctx, "login", StatusCode::OK, json!({ "email": email, "title": title }));
    };

    let message = match &error {
        AppError::InvalidCredentials => translator.translate("auth.invalid_credentials", &ctx.locale, &[]),
        AppError::AccountInactive => translator.translate("auth.account_inactive", &ctx.locale, &[]),
        AppError::CsrfMismatch => translator.translate("auth.csrf_mismatch", &ctx.locale, &[]),
        AppError::Validation(_) => translator.translate("auth.invalid_input", &ctx.locale, &[]),
        AppError::TooManyRequests { retry_after } => {
            let seconds = retry_after.to_string();
            translator.translate("auth.too_many_attempts", &ctx.locale, &[("seconds", &seconds)])
        }
        _ => return error_page(state, ctx, error),
    };

    let mut response = render(
        state,
        ctx,
        "login",
        error.status(),
        json!({ "email": email, "error": message, "title": title }),
    );
    if let AppError::TooManyRequests { retry_after } = error {
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
    }
    response
}

/// POST /logout
async fn logout(
    State(state): State<AppState>,
    Locale(locale): Locale,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<LogoutForm>,
) -> Response {
    let ctx = PageContext::new(locale);
    match end_session(&state, &jar, form.csrf_token.as_deref().or_else(|| header_token(&headers))).await {
        Ok(()) => {
            let jar = clear_session_cookie(jar, &state.config);
            (jar, Redirect::to("/login")).into_response()
        }
        Err(e) => error_page(&state, &ctx, e),
    }
}

async fn end_session(state: &AppState, jar: &CookieJar, csrf_token: Option<&str>) -> AppResult<()> {
    let Some(session) = current_session(state, jar).await? else {
        return Ok(());
    };
    state.services.sessions().verify_csrf(&session, csrf_token)?;
    state.services.sessions().destroy(&session.id).await?;

    if let Some(user_id) = session.user_id {
        tracing::info!(user_id = %user_id, "Web session ended");
        state
            .services
            .events()
            .dispatch(DomainEvent::UserLoggedOut { user_id })
            .await;
    }
    Ok(())
}

/// GET /profile
async fn profile(State(state): State<AppState>, Locale(locale): Locale, jar: CookieJar) -> Response {
    let ctx = match PageContext::load(&state, &jar, &locale).await {
        Ok(ctx) => ctx,
        Err(e) => return error_page(&state, &PageContext::new(locale), e),
    };
    if ctx.user.is_none() {
        return Redirect::to("/login").into_response();
    }

    let title = ctx.t(&state, "profile.title");
    render(&state, &ctx, "profile", StatusCode::OK, json!({ "title": title }))
}
