//! Unauthenticated service endpoints: health probes and schema version.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, VersionResponse};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub checks: HealthReadinessChecks,
}

/// GET /health/live
pub async fn health_live(State(state): State<Arc<AppState>>) -> Json<HealthLiveResponse> {
    Json(HealthLiveResponse {
        status: "alive",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /health/ready
///
/// `503` while the database is unreachable.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> Response {
    let database = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed: database unreachable");
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthReadyResponse {
        ready: database,
        checks: HealthReadinessChecks { database },
    };

    (status, Json(body)).into_response()
}

/// GET /version
pub async fn get_version(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<VersionResponse>>, ApiError> {
    let version = state.store().latest_migration().await?;
    Ok(Json(ApiResponse::success(VersionResponse { version })))
}
