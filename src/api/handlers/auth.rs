//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{ClientInfo, ValidatedJson};
use crate::api::middleware::{auth_middleware, CurrentUser};
use crate::api::session::ensure_session;
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;
use crate::services::TokenResponse;
use crate::types::{ApiResponse, Created};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// At least 8 characters with a lowercase letter, an uppercase letter and a digit
    #[schema(example = "SecurePass123", min_length = 8)]
    pub password: String,
    /// Display name, 2-100 characters
    #[schema(example = "John Doe")]
    pub name: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "SecurePass123")]
    pub password: String,
}

/// CSRF token of the caller's session
#[derive(Debug, Serialize, ToSchema)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Create authentication routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/csrf-token", get(csrf_token))
        .merge(protected)
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<UserResponse>> {
    let user = state
        .services
        .auth()
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok(Created(UserResponse::from(user)))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account not active"),
        (status = 422, description = "Validation error"),
        (status = 429, description = "Too many failed attempts")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let token = state
        .services
        .auth()
        .login(&payload.email, &payload.password, client.ip_address.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(token)))
}

/// Exchange a valid token for a fresh one
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New token issued, the old one is revoked", body = TokenResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let token = state.services.auth().refresh(&current_user.claims).await?;
    Ok(Json(ApiResponse::success(token)))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.auth().logout(&current_user.claims).await?;
    Ok(Json(ApiResponse::message("Logged out")))
}

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(Extension(current_user): Extension<CurrentUser>) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::success(UserResponse::from(current_user.user)))
}

/// CSRF token of the session, starting a guest session when needed
#[utoipa::path(
    get,
    path = "/api/auth/csrf-token",
    tag = "Authentication",
    responses(
        (status = 200, description = "Session CSRF token", body = CsrfTokenResponse)
    )
)]
pub async fn csrf_token(
    State(state): State<AppState>,
    client: ClientInfo,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let (session, jar) = ensure_session(&state, jar, &client).await?;
    let body = ApiResponse::success(CsrfTokenResponse {
        csrf_token: session.csrf_token,
    });
    Ok((jar, Json(body)))
}
