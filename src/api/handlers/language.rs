//! Locale selection and translation catalogs.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{Locale, ValidatedJson};
use crate::api::AppState;
use crate::config::LOCALE_COOKIE;
use crate::errors::{AppError, AppResult};
use crate::services::i18n::Catalog;
use crate::types::ApiResponse;

/// Locale settings for the caller
#[derive(Debug, Serialize, ToSchema)]
pub struct LanguageResponse {
    #[schema(example = "sk")]
    pub current: String,
    #[schema(example = "en")]
    pub default: String,
    pub supported: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetLanguageRequest {
    #[validate(length(min = 1, message = "Locale is required"))]
    #[schema(example = "cs")]
    pub locale: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(current).post(set_language))
        .route("/:locale/translations", get(translations))
}

fn language(state: &AppState, current: String) -> LanguageResponse {
    let translator = state.services.translator();
    LanguageResponse {
        current,
        default: translator.default_locale().to_string(),
        supported: translator.supported_locales().to_vec(),
    }
}

/// Current, default and supported locales
#[utoipa::path(
    get,
    path = "/api/language",
    tag = "Language",
    responses(
        (status = 200, description = "Locale settings", body = LanguageResponse)
    )
)]
pub async fn current(State(state): State<AppState>, Locale(locale): Locale) -> Json<ApiResponse<LanguageResponse>> {
    Json(ApiResponse::success(language(&state, locale)))
}

/// Remember a locale in the locale cookie
#[utoipa::path(
    post,
    path = "/api/language",
    tag = "Language",
    request_body = SetLanguageRequest,
    responses(
        (status = 200, description = "Locale stored", body = LanguageResponse),
        (status = 422, description = "Unsupported locale")
    )
)]
pub async fn set_language(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SetLanguageRequest>,
) -> AppResult<impl IntoResponse> {
    let translator = state.services.translator();
    let locale = payload.locale.trim().to_lowercase();
    if !translator.is_supported(&locale) {
        let message = translator.translate("language.unsupported", translator.default_locale(), &[("locale", &locale)]);
        return Err(AppError::field("locale", message));
    }

    let cookie = Cookie::build((LOCALE_COOKIE, locale.clone()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(state.config.session_secure);
    let message = translator.translate("language.changed", &locale, &[]);
    let body = ApiResponse::with_message(language(&state, locale), message);

    Ok((jar.add(cookie), Json(body)))
}

/// Flattened translation catalog of a locale
#[utoipa::path(
    get,
    path = "/api/language/{locale}/translations",
    tag = "Language",
    params(
        ("locale" = String, Path, description = "Locale code")
    ),
    responses(
        (status = 200, description = "Dotted key to message", body = Object),
        (status = 404, description = "Unsupported locale")
    )
)]
pub async fn translations(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> AppResult<Json<ApiResponse<Catalog>>> {
    let translator = state.services.translator();
    let catalog = translator
        .catalog(&locale)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("Locale '{}'", locale)))?;
    Ok(Json(ApiResponse::success(catalog)))
}
