//! Basic handlers - health and readiness probes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use super::ShifuState;

/// Readiness check response.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessStatus {
    pub ready: bool,
    pub collecting: bool,
}

/// Liveness probe.
pub async fn health_handler() -> &'static str {
    "ok"
}

/// Readiness probe - ready once telemetry collection is running, or when
/// there is nothing to collect.
pub async fn readiness_handler(State(shifu): State<ShifuState>) -> (StatusCode, Json<ReadinessStatus>) {
    let collecting = shifu.is_collecting().await;
    let ready = collecting || shifu.config().telemetries.is_none();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadinessStatus { ready, collecting }))
}
