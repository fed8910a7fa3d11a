//! Request timing.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::AppState;

/// Time every request as `http.request`, tagged with method, route and
/// status. Requests slower than `SLOW_REQUEST_MS` are logged as warnings.
pub async fn request_metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    // Route template keeps the metric cardinality bounded
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let monitor = state.services.monitor();
    let timer = monitor
        .start_timer("http.request")
        .tag("method", method.clone())
        .tag("route", route.clone());

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = timer.tag("status", status).stop();

    if elapsed_ms > state.config.slow_request_ms as f64 {
        tracing::warn!(%method, %route, status, elapsed_ms, "Slow request");
    }

    response
}
