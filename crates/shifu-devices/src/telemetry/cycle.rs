//! One telemetry collection attempt.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::resolve::ResolvedTelemetry;
use crate::error::DeviceError;
use crate::protocol::DeviceResult;
use crate::push::{PushSink, TelemetryPayload};
use crate::report::Reporter;

/// Result of one acquisition attempt.
#[derive(Debug)]
pub enum CollectionOutcome {
    /// The device produced a value
    Collected(Value),
    /// The device had nothing new to report; not an error
    NoData,
    /// The acquisition itself failed
    Failed(DeviceError),
}

impl From<DeviceResult<Value>> for CollectionOutcome {
    fn from(result: DeviceResult<Value>) -> Self {
        match result {
            Ok(Value::Null) => CollectionOutcome::NoData,
            Ok(value) => CollectionOutcome::Collected(value),
            Err(err) => CollectionOutcome::Failed(err),
        }
    }
}

/// What happened to a collected value downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushStatus {
    /// Pushing is off for this telemetry
    Disabled,
    /// Pushing is on but no collection service is configured
    NoAddress,
    Delivered,
    Failed,
}

/// Summary of one cycle. Never an error: failures are reported, not returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "push")]
pub enum CycleReport {
    Collected(PushStatus),
    NoData,
    Failed,
}

/// Runs collection cycles for one resolved telemetry.
pub struct TelemetryCollector {
    device: String,
    namespace: String,
    telemetry: ResolvedTelemetry,
    sink: Arc<dyn PushSink>,
    reporter: Arc<dyn Reporter>,
}

impl TelemetryCollector {
    pub fn new(
        device: impl Into<String>,
        namespace: impl Into<String>,
        telemetry: ResolvedTelemetry,
        sink: Arc<dyn PushSink>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            device: device.into(),
            namespace: namespace.into(),
            telemetry,
            sink,
            reporter,
        }
    }

    pub fn telemetry(&self) -> &ResolvedTelemetry {
        &self.telemetry
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter> {
        &self.reporter
    }

    /// Reporting context for this telemetry.
    pub fn context(&self) -> String {
        format!("{}/telemetry/{}", self.device, self.telemetry.name)
    }

    /// Invoke `acquire` once, bounded by the telemetry timeout, and push a
    /// collected value when pushing is enabled.
    pub async fn run_cycle<F, Fut>(&self, acquire: F) -> CycleReport
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CollectionOutcome>,
    {
        let timeout = self.telemetry.timeout();
        let outcome = match tokio::time::timeout(timeout, acquire()).await {
            Ok(outcome) => outcome,
            Err(_) => CollectionOutcome::Failed(DeviceError::Timeout(timeout.as_millis() as u64)),
        };

        match outcome {
            CollectionOutcome::Collected(value) => CycleReport::Collected(self.push(value).await),
            CollectionOutcome::NoData => {
                debug!(telemetry = %self.telemetry.name, "no data to report");
                CycleReport::NoData
            }
            CollectionOutcome::Failed(err) => {
                self.reporter.report_error(&self.context(), &err);
                CycleReport::Failed
            }
        }
    }

    async fn push(&self, value: Value) -> PushStatus {
        if !self.telemetry.push_to_server.value {
            return PushStatus::Disabled;
        }
        let Some(address) = self.telemetry.push_target() else {
            self.reporter.report_warning(
                &self.context(),
                "push enabled but no collection service configured",
            );
            return PushStatus::NoAddress;
        };

        let payload = TelemetryPayload {
            device: self.device.clone(),
            namespace: self.namespace.clone(),
            telemetry: self.telemetry.name.clone(),
            value,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        let timeout = self.telemetry.timeout();
        let result = match tokio::time::timeout(timeout, self.sink.push(address, &payload, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(crate::error::PushError::Transport {
                address: address.to_string(),
                reason: format!("timed out after {}ms", timeout.as_millis()),
            }),
        };

        match result {
            Ok(()) => {
                debug!(telemetry = %self.telemetry.name, address, "telemetry pushed");
                PushStatus::Delivered
            }
            Err(err) => {
                self.reporter.report_error(&self.context(), &err);
                PushStatus::Failed
            }
        }
    }
}
