//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{Claims, User};
use crate::errors::{AppError, AppResult};

/// Authenticated caller: the stored user plus the claims of the presented token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub claims: Claims,
}

/// JWT authentication middleware.
///
/// Extracts and validates the JWT token from the Authorization header, loads
/// the user it names and injects a [`CurrentUser`] into the request
/// extensions. A token for a deleted user is unauthorized; one for an
/// inactive user is forbidden.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let current_user = authenticate(&state, token).await?;
    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

async fn authenticate(state: &AppState, token: &str) -> AppResult<CurrentUser> {
    let claims = state.services.auth().verify_token(token).await?;

    let user = match state.services.users().get_user(claims.sub).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => return Err(AppError::Unauthorized),
        Err(e) => return Err(e),
    };

    if !user.is_active() {
        return Err(AppError::AccountInactive);
    }

    Ok(CurrentUser { user, claims })
}
