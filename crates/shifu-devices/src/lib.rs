//! Device shim core.
//!
//! This crate owns the telemetry engine of a deviceShifu: the process that
//! runs beside one device and turns its native protocol into telemetry and
//! HTTP endpoints.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `http` | ✅ | HTTP protocol client and HTTP push sink |
//!
//! ## Architecture
//!
//! - **DeviceShifuConfig**: ConfigMap model (defaults plus per-telemetry overrides)
//! - **validate_telemetry_config**: consistency gate run before any loop starts
//! - **TelemetryCollector**: one acquisition attempt and the push decision
//! - **Scheduler**: one independent loop per telemetry, cooperative shutdown
//! - **ProtocolClient / PushSink / Reporter / ConfigSource**: collaborator traits

pub mod config;
pub mod error;
pub mod protocol;
pub mod push;
pub mod report;
pub mod source;
pub mod telemetry;

pub use config::{
    DEFAULT_CONFIG_PATH, DeviceShifuConfig, DeviceShifuTelemetries, EdgeDeviceSpec, Protocol,
    TelemetryDefinition, TelemetrySettings,
};
pub use error::{ConfigError, DeviceError, DurationField, PushError};
pub use protocol::{Command, DefaultClientFactory, DeviceResult, ProtocolClient, ProtocolClientFactory};
pub use push::{PushSink, TelemetryPayload};
pub use report::{ChannelReporter, ReportEvent, ReportLevel, Reporter, TracingReporter};
pub use source::{ConfigMapSource, ConfigSource};
pub use telemetry::{
    CollectionOutcome, CycleReport, DevicePhase, LoopState, PushStatus, Scheduler,
    TelemetryCollector, TelemetryStatus, validate_telemetry_config,
};

#[cfg(feature = "http")]
pub use protocol::HttpProtocolClient;
#[cfg(feature = "http")]
pub use push::HttpPushSink;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
