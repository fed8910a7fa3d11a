//! Session cookie plumbing for the server-rendered pages.

use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};

use super::extractors::ClientInfo;
use super::AppState;
use crate::config::Config;
use crate::domain::{Session, User};
use crate::errors::{AppError, AppResult};

/// HttpOnly, `SameSite=Lax` cookie carrying a session id
pub fn session_cookie(config: &Config, id: &str) -> Cookie<'static> {
    Cookie::build((config.session_cookie.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.session_secure)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar, config: &Config) -> CookieJar {
    jar.remove(Cookie::build(config.session_cookie.clone()).path("/"))
}

/// Live session named by the cookie, if any
pub async fn current_session(state: &AppState, jar: &CookieJar) -> AppResult<Option<Session>> {
    match jar.get(&state.config.session_cookie) {
        Some(cookie) => state.services.sessions().load(cookie.value()).await,
        None => Ok(None),
    }
}

/// Live session, starting a guest session (and setting its cookie) when
/// the visitor has none.
pub async fn ensure_session(state: &AppState, jar: CookieJar, client: &ClientInfo) -> AppResult<(Session, CookieJar)> {
    let existing = jar.get(&state.config.session_cookie).map(|c| c.value().to_string());
    let (session, created) = state
        .services
        .sessions()
        .load_or_start(
            existing.as_deref(),
            client.ip_address.clone(),
            client.user_agent.clone(),
        )
        .await?;

    let jar = if created {
        jar.add(session_cookie(&state.config, &session.id))
    } else {
        jar
    };
    Ok((session, jar))
}

/// Active user bound to the session. A session whose user vanished or was
/// deactivated is destroyed.
pub async fn session_user(state: &AppState, session: &Session) -> AppResult<Option<User>> {
    let Some(user_id) = session.user_id else {
        return Ok(None);
    };

    match state.services.users().get_user(user_id).await {
        Ok(user) if user.is_active() => Ok(Some(user)),
        Ok(_) | Err(AppError::NotFound(_)) => {
            state.services.sessions().destroy(&session.id).await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
