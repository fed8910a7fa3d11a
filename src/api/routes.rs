//! Application route configuration.

use axum::{middleware, response::Redirect, routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::middleware::request_metrics_middleware;
use super::openapi::ApiDoc;
use super::AppState;
use crate::errors::middleware::{handle_panic, not_found_fallback, problem_details_middleware};

/// Create the application router from the loaded modules
pub fn create_router(state: AppState) -> Router {
    let home = if state.modules.is_loaded("blog") {
        "/blog"
    } else {
        "/login"
    };

    state
        .modules
        .routes(&state)
        .route("/", get(move || async move { Redirect::to(home) }))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found_fallback)
        // Global middleware, innermost first
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), problem_details_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), request_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
