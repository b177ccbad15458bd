//! Response models shared by the handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use shifu_devices::DeviceError;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Handler error mapped onto an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

impl From<DeviceError> for ApiError {
    fn from(err: DeviceError) -> Self {
        let (status, code) = match &err {
            DeviceError::InvalidInstruction(_) => (StatusCode::NOT_FOUND, "INSTRUCTION_NOT_FOUND"),
            DeviceError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "DEVICE_TIMEOUT"),
            DeviceError::UnsupportedProtocol(_) => (StatusCode::NOT_IMPLEMENTED, "UNSUPPORTED_PROTOCOL"),
            DeviceError::Connection(_) | DeviceError::Communication(_) | DeviceError::Other(_) => {
                (StatusCode::BAD_GATEWAY, "DEVICE_ERROR")
            }
        };
        ApiError::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_mapping() {
        let err = ApiError::from(DeviceError::InvalidInstruction("fly".to_string()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.body.code, "INSTRUCTION_NOT_FOUND");

        let err = ApiError::from(DeviceError::Timeout(300));
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);

        let err = ApiError::from(DeviceError::Connection("refused".to_string()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.body.message.contains("refused"));
    }
}
