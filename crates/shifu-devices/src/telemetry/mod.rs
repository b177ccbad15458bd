//! Telemetry validation, resolution and scheduling.

pub mod cycle;
pub mod resolve;
pub mod scheduler;
pub mod validate;

pub use cycle::{CollectionOutcome, CycleReport, PushStatus, TelemetryCollector};
pub use resolve::{Origin, Resolved, ResolvedTelemetry, resolve};
pub use scheduler::{DevicePhase, LoopState, Scheduler, TelemetryStatus};
pub use validate::validate_telemetry_config;
