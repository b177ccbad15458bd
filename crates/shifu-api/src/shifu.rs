//! The running deviceShifu instance.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use shifu_devices::{
    Command, DeviceError, DevicePhase, DeviceShifuConfig, EdgeDeviceSpec, ProtocolClient,
    PushSink, Reporter, Scheduler, TelemetryStatus,
};

/// Device status returned by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub namespace: String,
    pub protocol: String,
    pub address: String,
    pub phase: DevicePhase,
    pub collecting: bool,
    pub telemetries: Vec<TelemetryStatus>,
    pub uptime: u64,
}

/// One shim instance bound to one device.
///
/// Configuration is immutable after bootstrap. The protocol client is the
/// only resource shared between the HTTP surface and the telemetry loops.
pub struct DeviceShifu {
    name: String,
    namespace: String,
    edge_device: EdgeDeviceSpec,
    config: Arc<DeviceShifuConfig>,
    client: Arc<dyn ProtocolClient>,
    push_sink: Arc<dyn PushSink>,
    reporter: Arc<dyn Reporter>,
    scheduler: Mutex<Option<Scheduler>>,
    started_at: i64,
}

impl DeviceShifu {
    pub(crate) fn new(
        name: String,
        namespace: String,
        edge_device: EdgeDeviceSpec,
        config: DeviceShifuConfig,
        client: Arc<dyn ProtocolClient>,
        push_sink: Arc<dyn PushSink>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            name,
            namespace,
            edge_device,
            config: Arc::new(config),
            client,
            push_sink,
            reporter,
            scheduler: Mutex::new(None),
            started_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn edge_device(&self) -> &EdgeDeviceSpec {
        &self.edge_device
    }

    pub fn config(&self) -> &Arc<DeviceShifuConfig> {
        &self.config
    }

    pub fn protocol_client(&self) -> &Arc<dyn ProtocolClient> {
        &self.client
    }

    /// Launch one collection loop per configured telemetry.
    ///
    /// Returns the number of scheduled loops. Calling it again while
    /// collection is running does nothing.
    pub async fn start_telemetry_collection(&self) -> usize {
        let mut guard = self.scheduler.lock().await;
        if let Some(scheduler) = guard.as_ref() {
            return scheduler.len();
        }

        let Some(telemetries) = self.config.telemetries.as_ref() else {
            info!(device = %self.name, "no telemetries configured");
            return 0;
        };

        let scheduler = Scheduler::start(
            &self.name,
            &self.namespace,
            telemetries,
            self.client.clone(),
            self.push_sink.clone(),
            self.reporter.clone(),
        );
        let count = scheduler.len();
        *guard = Some(scheduler);
        count
    }

    /// Stop telemetry collection and wait for every loop to finish.
    pub async fn stop(&self) {
        let scheduler = self.scheduler.lock().await.take();
        if let Some(scheduler) = scheduler {
            scheduler.shutdown().await;
        }
    }

    pub async fn is_collecting(&self) -> bool {
        self.scheduler.lock().await.is_some()
    }

    /// Current status of the device and its telemetry loops.
    pub async fn status(&self) -> DeviceStatus {
        let guard = self.scheduler.lock().await;
        let (phase, telemetries) = match guard.as_ref() {
            Some(scheduler) => (scheduler.phase(), scheduler.statuses()),
            None => (DevicePhase::Pending, Vec::new()),
        };
        let uptime = chrono::Utc::now().timestamp() - self.started_at;

        DeviceStatus {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            protocol: self.edge_device.protocol.to_string(),
            address: self.edge_device.address.clone(),
            phase,
            collecting: guard.is_some(),
            telemetries,
            uptime: uptime.max(0) as u64,
        }
    }

    /// Execute a declared instruction on the device.
    pub async fn execute_instruction(
        &self,
        instruction: &str,
        payload: Option<Value>,
    ) -> Result<Value, DeviceError> {
        let instructions = &self.config.instructions;
        if !instructions.contains(instruction) {
            return Err(DeviceError::InvalidInstruction(instruction.to_string()));
        }

        let timeout = Duration::from_millis(instructions.timeout_ms(instruction));
        let mut command = Command::new(instruction, timeout);
        if let Some(payload) = payload {
            command = command.with_payload(payload);
        }

        match tokio::time::timeout(timeout, self.client.execute(&command)).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Timeout(timeout.as_millis() as u64)),
        }
    }
}

impl std::fmt::Debug for DeviceShifu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceShifu")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("edge_device", &self.edge_device)
            .field("protocol_client", &self.client.protocol())
            .finish_non_exhaustive()
    }
}
