//! Shared fixtures for the shifu-api tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use shifu_api::{ShifuDeps, ShifuMetadata};
use shifu_devices::config::{
    DeviceShifuInstruction, DeviceShifuInstructions, DeviceShifuTelemetries, TelemetryDefinition,
    TelemetrySettings,
};
use shifu_devices::{
    ChannelReporter, Command, ConfigError, ConfigSource, DeviceError, DeviceResult,
    DeviceShifuConfig, EdgeDeviceSpec, Protocol, ProtocolClient, ProtocolClientFactory,
    PushError, PushSink, TelemetryPayload,
};

/// Thermometer-like device.
#[derive(Default)]
pub struct StubClient {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ProtocolClient for StubClient {
    fn protocol(&self) -> &'static str {
        "stub"
    }

    async fn execute(&self, command: &Command) -> DeviceResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match command.instruction.as_str() {
            "get_reading" => Ok(json!({"temperature": 21.5})),
            "echo" => Ok(command.payload.clone().unwrap_or(Value::Null)),
            "broken" => Err(DeviceError::Connection("connection refused".to_string())),
            _ => Ok(Value::Null),
        }
    }
}

/// Hands out one shared [`StubClient`] for HTTP devices.
pub struct StubFactory(pub Arc<StubClient>);

impl ProtocolClientFactory for StubFactory {
    fn create(&self, device: &EdgeDeviceSpec) -> DeviceResult<Arc<dyn ProtocolClient>> {
        match device.protocol {
            Protocol::Http => Ok(self.0.clone()),
            other => Err(DeviceError::UnsupportedProtocol(other.to_string())),
        }
    }
}

/// In-memory configuration.
pub struct StaticSource(pub DeviceShifuConfig);

impl ConfigSource for StaticSource {
    fn load(&self, _path: &Path) -> Result<DeviceShifuConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct NullSink;

#[async_trait]
impl PushSink for NullSink {
    async fn push(
        &self,
        _address: &str,
        _payload: &TelemetryPayload,
        _timeout: std::time::Duration,
    ) -> Result<(), PushError> {
        Ok(())
    }
}

pub fn thermometer_config() -> DeviceShifuConfig {
    let mut instructions = DeviceShifuInstructions::default();
    for name in ["get_reading", "echo", "broken"] {
        instructions
            .instructions
            .insert(name.to_string(), DeviceShifuInstruction::default());
    }

    let mut telemetries = DeviceShifuTelemetries {
        telemetry_settings: Some(TelemetrySettings {
            interval_ms: Some(100),
            ..Default::default()
        }),
        ..Default::default()
    };
    telemetries.telemetries.insert(
        "temperature".to_string(),
        TelemetryDefinition::with_instruction("get_reading"),
    );

    DeviceShifuConfig {
        instructions,
        telemetries: Some(telemetries),
        ..Default::default()
    }
}

pub fn metadata(name: &str) -> ShifuMetadata {
    ShifuMetadata::new(
        name,
        "devices",
        EdgeDeviceSpec {
            protocol: Protocol::Http,
            address: "10.0.0.5:8080".to_string(),
        },
    )
}

pub fn deps(config: DeviceShifuConfig, client: Arc<StubClient>) -> ShifuDeps {
    ShifuDeps::default()
        .with_config_source(Arc::new(StaticSource(config)))
        .with_client_factory(Arc::new(StubFactory(client)))
        .with_push_sink(Arc::new(NullSink))
        .with_reporter(Arc::new(ChannelReporter::default()))
}
