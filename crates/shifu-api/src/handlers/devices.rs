//! Device handlers - status and instruction triggers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use tracing::debug;

use super::ShifuState;
use crate::models::ApiResult;
use crate::shifu::DeviceStatus;

/// Device and telemetry status.
pub async fn status_handler(State(shifu): State<ShifuState>) -> Json<DeviceStatus> {
    Json(shifu.status().await)
}

/// Trigger an instruction without payload.
pub async fn get_instruction_handler(
    State(shifu): State<ShifuState>,
    Path(instruction): Path<String>,
) -> ApiResult<Json<Value>> {
    debug!(instruction = %instruction, "instruction triggered");
    let result = shifu.execute_instruction(&instruction, None).await?;
    Ok(Json(result))
}

/// Trigger an instruction with an optional JSON payload.
pub async fn post_instruction_handler(
    State(shifu): State<ShifuState>,
    Path(instruction): Path<String>,
    payload: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    debug!(instruction = %instruction, with_payload = payload.is_some(), "instruction triggered");
    let result = shifu
        .execute_instruction(&instruction, payload.map(|Json(v)| v))
        .await?;
    Ok(Json(result))
}
