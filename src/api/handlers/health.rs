//! Health, status and metrics endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::middleware::{auth_middleware, CurrentUser};
use crate::api::AppState;
use crate::config::APP_VERSION;
use crate::domain::{HealthCheckResult, HealthReport, HealthStatus, Permission};
use crate::errors::{AppError, AppResult};
use crate::modules::ModuleDescriptor;
use crate::services::{authorize, MetricSummary};
use crate::types::ApiResponse;

/// Short health view used by the status page
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthSummary {
    pub status: HealthStatus,
    /// Check name to status
    pub checks: BTreeMap<String, HealthStatus>,
}

impl From<&HealthReport> for HealthSummary {
    fn from(report: &HealthReport) -> Self {
        Self {
            status: report.status,
            checks: report
                .checks
                .iter()
                .map(|c| (c.name.clone(), c.status))
                .collect(),
        }
    }
}

/// Application status
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "HDM Boot")]
    pub app_name: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "development")]
    pub environment: String,
    pub uptime_seconds: i64,
    pub modules: Vec<ModuleDescriptor>,
    pub health: HealthSummary,
    pub metrics: BTreeMap<String, MetricSummary>,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/monitoring/metrics", get(metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/health/:name", get(health_check))
        .route("/_status", get(status))
        .merge(protected)
}

/// Run every health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "Monitoring",
    responses(
        (status = 200, description = "Healthy or degraded", body = HealthReport),
        (status = 503, description = "At least one check is unhealthy", body = HealthReport)
    )
)]
pub async fn health(State(state): State<AppState>) -> Response {
    let report = state.services.health().check_all().await;
    let status = if report.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(report)).into_response()
}

/// Run one health check
#[utoipa::path(
    get,
    path = "/health/{name}",
    tag = "Monitoring",
    params(
        ("name" = String, Path, description = "Check name: database, filesystem or runtime")
    ),
    responses(
        (status = 200, description = "Check result", body = HealthCheckResult),
        (status = 404, description = "Unknown check")
    )
)]
pub async fn health_check(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<HealthCheckResult>> {
    state
        .services
        .health()
        .check(&name)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Health check '{}'", name)))
}

/// Application status overview
#[utoipa::path(
    get,
    path = "/_status",
    tag = "Monitoring",
    responses(
        (status = 200, description = "Status overview", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let report = state.services.health().check_all().await;

    Json(StatusResponse {
        app_name: state.config.app_name.clone(),
        version: APP_VERSION.to_string(),
        environment: state.config.app_env.as_str().to_string(),
        uptime_seconds: report.uptime_seconds,
        modules: state.modules.descriptors(),
        health: HealthSummary::from(&report),
        metrics: state.services.monitor().summaries(),
    })
}

/// Aggregated performance metrics
#[utoipa::path(
    get,
    path = "/api/monitoring/metrics",
    tag = "Monitoring",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Metric aggregates by name", body = BTreeMap<String, MetricSummary>),
        (status = 403, description = "Missing monitoring.view")
    )
)]
pub async fn metrics(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<ApiResponse<BTreeMap<String, MetricSummary>>>> {
    authorize(&current_user.user, Permission::MonitoringView)?;
    Ok(Json(ApiResponse::success(state.services.monitor().summaries())))
}
