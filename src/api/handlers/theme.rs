//! Theme listing, activation and static assets.

use axum::{
    body::Body,
    extract::{Extension, Path, Request, State},
    middleware,
    response::{Json, Response},
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{auth_middleware, CurrentUser};
use crate::api::AppState;
use crate::errors::{AppError, AppResult};
use crate::services::ThemeInfo;
use crate::types::ApiResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ActivateThemeRequest {
    /// Theme directory name
    #[validate(length(min = 1, message = "Theme is required"))]
    #[schema(example = "default")]
    pub theme: String,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let activate = put(activate_theme).route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/themes", get(list_themes))
        .route("/api/themes/active", get(active_theme).merge(activate))
        .route("/themes/:theme/assets/*path", get(asset))
}

/// Installed themes
#[utoipa::path(
    get,
    path = "/api/themes",
    tag = "Themes",
    responses(
        (status = 200, description = "Installed themes", body = Vec<ThemeInfo>)
    )
)]
pub async fn list_themes(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<ThemeInfo>>>> {
    Ok(Json(ApiResponse::success(state.services.themes().list()?)))
}

/// Active theme; `null` while the built-in templates are in use
#[utoipa::path(
    get,
    path = "/api/themes/active",
    tag = "Themes",
    responses(
        (status = 200, description = "Active theme", body = Option<ThemeInfo>)
    )
)]
pub async fn active_theme(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Option<ThemeInfo>>>> {
    Ok(Json(ApiResponse::success(state.services.themes().active()?)))
}

/// Switch the active theme
#[utoipa::path(
    put,
    path = "/api/themes/active",
    tag = "Themes",
    security(("bearer_auth" = [])),
    request_body = ActivateThemeRequest,
    responses(
        (status = 200, description = "Theme activated", body = ThemeInfo),
        (status = 403, description = "Missing theme.manage"),
        (status = 404, description = "Unknown theme")
    )
)]
pub async fn activate_theme(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ActivateThemeRequest>,
) -> AppResult<Json<ApiResponse<ThemeInfo>>> {
    let theme = state
        .services
        .themes()
        .activate(&current_user.user, &payload.theme)?;
    Ok(Json(ApiResponse::success(theme)))
}

/// Static file from a theme's `assets/` directory
async fn asset(
    State(state): State<AppState>,
    Path((theme, path)): Path<(String, String)>,
    request: Request,
) -> AppResult<Response> {
    let file = state
        .services
        .themes()
        .asset_path(&theme, &path)
        .ok_or_else(|| AppError::not_found("Asset"))?;

    match ServeFile::new(file).oneshot(request).await {
        Ok(response) => Ok(response.map(Body::new)),
        Err(never) => match never {},
    }
}
