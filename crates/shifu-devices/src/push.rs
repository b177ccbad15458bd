//! Delivery of collected telemetry to a downstream collection service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PushError;

/// Body sent to the collection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub device: String,
    pub namespace: String,
    pub telemetry: String,
    pub value: Value,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

/// Downstream telemetry sink. Callers pass the timeout; implementations
/// must not wait longer.
#[async_trait]
pub trait PushSink: Send + Sync {
    async fn push(
        &self,
        address: &str,
        payload: &TelemetryPayload,
        timeout: Duration,
    ) -> Result<(), PushError>;
}

/// Sink that POSTs the payload as JSON.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpPushSink {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpPushSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl PushSink for HttpPushSink {
    async fn push(
        &self,
        address: &str,
        payload: &TelemetryPayload,
        timeout: Duration,
    ) -> Result<(), PushError> {
        let url = collection_url(address);
        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| PushError::Transport {
                address: url.clone(),
                reason: e.to_string(),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PushError::Rejected {
                address: url,
                status: response.status().as_u16(),
            })
        }
    }
}

/// Collection service addresses may omit the scheme.
pub fn collection_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}
