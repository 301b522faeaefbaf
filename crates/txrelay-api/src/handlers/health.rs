//! Health check handlers for service monitoring.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use txrelay_delivery::StatsSnapshot;

use crate::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Service version information
    pub version: String,
    /// Seconds since the process started
    pub uptime_seconds: u64,
    /// Forward counters at the time of the check
    pub forwards: StatsSnapshot,
}

/// Overall health status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Process is running
    Healthy,
}

/// Health check endpoint handler.
///
/// Reports forward stats. There are no dependencies to probe, so the
/// service is healthy whenever it can answer.
#[instrument(name = "health_check", skip(app_state))]
pub async fn health_check(State(app_state): State<AppState>) -> Response {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: app_state.started_at.elapsed().as_secs(),
        forwards: app_state.stats.snapshot(),
    };

    debug!(status = ?response.status, forwards = ?response.forwards, "Health check completed");

    (StatusCode::OK, Json(response)).into_response()
}

/// Liveness check endpoint.
///
/// Returns a simple response indicating the process is alive.
#[instrument(name = "liveness_check", skip_all)]
pub async fn liveness_check() -> Response {
    debug!("Performing liveness check");

    let response = serde_json::json!({
        "status": "alive",
        "timestamp": Utc::now(),
        "service": "txrelay"
    });

    (StatusCode::OK, Json(response)).into_response()
}
