//! Protocol client interface.
//!
//! A protocol client turns a named instruction into a request in the
//! device's native protocol. The shim shares one client between the HTTP
//! surface and every telemetry loop, so implementations must be safe for
//! concurrent use.

#[cfg(feature = "http")]
pub mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{EdgeDeviceSpec, Protocol};
use crate::error::DeviceError;

#[cfg(feature = "http")]
pub use http::HttpProtocolClient;

/// Result type for protocol operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// A single instruction to execute on the device.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Instruction name as declared in the configuration
    pub instruction: String,
    /// Optional payload forwarded to the device
    pub payload: Option<Value>,
    /// Upper bound for the device round trip
    pub timeout: Duration,
}

impl Command {
    pub fn new(instruction: impl Into<String>, timeout: Duration) -> Self {
        Self {
            instruction: instruction.into(),
            payload: None,
            timeout,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Device protocol client.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Protocol identifier (e.g., "HTTP").
    fn protocol(&self) -> &'static str;

    /// Execute an instruction and return the raw result.
    ///
    /// `Value::Null` means the device had nothing to report.
    async fn execute(&self, command: &Command) -> DeviceResult<Value>;
}

/// Builds the protocol client for an EdgeDevice.
pub trait ProtocolClientFactory: Send + Sync {
    fn create(&self, device: &EdgeDeviceSpec) -> DeviceResult<Arc<dyn ProtocolClient>>;
}

/// Factory for the drivers compiled into this crate.
#[derive(Debug, Default, Clone)]
pub struct DefaultClientFactory;

impl ProtocolClientFactory for DefaultClientFactory {
    fn create(&self, device: &EdgeDeviceSpec) -> DeviceResult<Arc<dyn ProtocolClient>> {
        match device.protocol {
            #[cfg(feature = "http")]
            Protocol::Http => Ok(Arc::new(HttpProtocolClient::new(&device.address)?)),
            other => Err(DeviceError::UnsupportedProtocol(other.to_string())),
        }
    }
}
