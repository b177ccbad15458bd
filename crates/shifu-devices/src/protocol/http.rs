//! HTTP protocol client.
//!
//! Instructions map to paths on the device's HTTP endpoint:
//! `GET http://<address>/<instruction>` without a payload, `POST` with a
//! JSON payload. JSON responses are returned as-is, other bodies as a JSON
//! string, and an empty body as `Value::Null`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{Command, DeviceResult, ProtocolClient};
use crate::error::DeviceError;

/// HTTP device client.
#[derive(Debug, Clone)]
pub struct HttpProtocolClient {
    base_url: String,
    client: Client,
}

impl HttpProtocolClient {
    /// Create a client for the device reachable at `address`
    /// (`host:port` or a full URL).
    pub fn new(address: &str) -> DeviceResult<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| DeviceError::Connection(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            base_url: normalize_base_url(address),
            client,
        })
    }

    /// Base URL all instructions are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, instruction: &str) -> String {
        format!("{}/{}", self.base_url, instruction.trim_start_matches('/'))
    }
}

#[async_trait]
impl ProtocolClient for HttpProtocolClient {
    fn protocol(&self) -> &'static str {
        "HTTP"
    }

    async fn execute(&self, command: &Command) -> DeviceResult<Value> {
        let url = self.url_for(&command.instruction);
        debug!(url = %url, "executing HTTP instruction");

        let request = match &command.payload {
            Some(payload) => self.client.post(&url).json(payload),
            None => self.client.get(&url),
        };

        let response = request.timeout(command.timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                DeviceError::Timeout(command.timeout.as_millis() as u64)
            } else {
                DeviceError::Connection(format!("HTTP request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(DeviceError::Communication(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DeviceError::Communication(format!("Text read error: {}", e)))?;

        Ok(parse_body(&text))
    }
}

fn normalize_base_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn parse_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(normalize_base_url("10.0.0.2:8080"), "http://10.0.0.2:8080");
        assert_eq!(normalize_base_url("http://device.local/"), "http://device.local");
        assert_eq!(normalize_base_url("https://device.local"), "https://device.local");
    }

    #[test]
    fn test_url_for_instruction() {
        let client = HttpProtocolClient::new("10.0.0.2:8080").unwrap();
        assert_eq!(client.url_for("get_status"), "http://10.0.0.2:8080/get_status");
        assert_eq!(client.url_for("/get_status"), "http://10.0.0.2:8080/get_status");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body("{\"t\": 21.5}"), serde_json::json!({"t": 21.5}));
        assert_eq!(parse_body("running"), Value::String("running".to_string()));
    }
}
