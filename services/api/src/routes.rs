use crate::infra::{parse_local_datetime, AppState};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use siteline::availability::{compute_status, AvailabilityStatus, WeeklySchedule};
use siteline::error::AppError;
use std::sync::atomic::Ordering;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AvailabilityQuery {
    /// Evaluate against this local time instead of the monitor's latest value.
    #[serde(default)]
    pub(crate) at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScheduleResponse {
    pub(crate) summary: String,
    pub(crate) always_closed: bool,
    #[serde(flatten)]
    pub(crate) schedule: WeeklySchedule,
}

pub(crate) fn with_availability_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/availability", get(availability_endpoint))
        .route("/api/v1/availability/schedule", get(schedule_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed) && state.availability.is_running();
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "initializing")
    };

    (status, Json(json!({ "status": label })))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn availability_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityStatus>, AppError> {
    let status = match query.at {
        Some(raw) => {
            let at = parse_local_datetime(&raw).map_err(AppError::InvalidInput)?;
            compute_status(at, &state.schedule)
        }
        None => state.availability.current(),
    };
    Ok(Json(status))
}

pub(crate) async fn schedule_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<ScheduleResponse> {
    let schedule = state.schedule.as_ref().clone();
    Json(ScheduleResponse {
        summary: schedule.to_string(),
        always_closed: schedule.is_always_closed(),
        schedule,
    })
}
