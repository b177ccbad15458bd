//! Per-telemetry collection loops.
//!
//! Every telemetry with a resolvable interval gets its own tokio task:
//!
//! ```text
//! Pending --initial delay--> Running --shutdown signal--> Stopped
//! ```
//!
//! Ticks within one loop are strictly sequential; a tick that overruns the
//! interval delays the next one instead of overlapping it. Loops share
//! nothing mutable except the protocol client, and a failing tick never
//! ends a loop. Only the shutdown signal does.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::cycle::{CollectionOutcome, CycleReport, TelemetryCollector};
use super::resolve::ResolvedTelemetry;
use crate::config::DeviceShifuTelemetries;
use crate::protocol::{Command, ProtocolClient};
use crate::push::PushSink;
use crate::report::Reporter;

/// Lifecycle of one telemetry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    /// Waiting out the initial delay
    Pending,
    /// Ticking
    Running,
    /// Terminal, entered on shutdown only
    Stopped,
}

/// Snapshot published by a loop after every state change and tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryStatus {
    pub name: String,
    pub state: LoopState,
    pub ticks: u64,
    /// Failed ticks since the last successful or benign one. Exposed for
    /// escalation policies; the scheduler itself never acts on it.
    pub consecutive_failures: u32,
    pub last_report: Option<CycleReport>,
    /// Unix timestamp (ms) of the last completed tick
    pub last_tick_at: Option<i64>,
}

impl TelemetryStatus {
    fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: LoopState::Pending,
            ticks: 0,
            consecutive_failures: 0,
            last_report: None,
            last_tick_at: None,
        }
    }

    fn record(&mut self, report: CycleReport) {
        self.ticks += 1;
        self.consecutive_failures = match report {
            CycleReport::Failed => self.consecutive_failures.saturating_add(1),
            _ => 0,
        };
        self.last_report = Some(report);
        self.last_tick_at = Some(chrono::Utc::now().timestamp_millis());
    }
}

/// Device health summary derived from the latest telemetry outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DevicePhase {
    Pending,
    Running,
    Failed,
    Unknown,
}

impl DevicePhase {
    /// `Unknown` without loops, `Pending` until a tick completes, `Failed`
    /// when every ticked loop last failed, `Running` otherwise.
    pub fn from_statuses(statuses: &[TelemetryStatus]) -> Self {
        if statuses.is_empty() {
            return DevicePhase::Unknown;
        }
        let reports: Vec<CycleReport> = statuses.iter().filter_map(|s| s.last_report).collect();
        if reports.is_empty() {
            DevicePhase::Pending
        } else if reports.iter().all(|r| *r == CycleReport::Failed) {
            DevicePhase::Failed
        } else {
            DevicePhase::Running
        }
    }
}

struct TelemetryLoop {
    name: String,
    status: watch::Receiver<TelemetryStatus>,
    handle: JoinHandle<()>,
    grace: Duration,
}

/// Owns every telemetry loop of one device.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    loops: Vec<TelemetryLoop>,
    skipped: Vec<String>,
}

impl Scheduler {
    /// Spawn one loop per telemetry. Must be called inside a tokio runtime,
    /// after the configuration has been validated.
    pub fn start(
        device: &str,
        namespace: &str,
        telemetries: &DeviceShifuTelemetries,
        client: Arc<dyn ProtocolClient>,
        sink: Arc<dyn PushSink>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let mut loops = Vec::new();
        let mut skipped = Vec::new();

        for telemetry in ResolvedTelemetry::resolve_all(telemetries) {
            let Some(interval) = telemetry.interval() else {
                reporter.report_warning(
                    &format!("{}/telemetry/{}", device, telemetry.name),
                    "no interval configured and no default available, telemetry not scheduled",
                );
                skipped.push(telemetry.name);
                continue;
            };

            let name = telemetry.name.clone();
            // acquisition and push are each bounded by the timeout
            let grace = telemetry.timeout() * 2 + Duration::from_millis(100);
            let (status_tx, status_rx) = watch::channel(TelemetryStatus::pending(&name));
            let collector =
                TelemetryCollector::new(device, namespace, telemetry, sink.clone(), reporter.clone());
            let handle = tokio::spawn(run_loop(
                collector,
                client.clone(),
                interval,
                status_tx,
                shutdown_tx.subscribe(),
            ));

            loops.push(TelemetryLoop {
                name,
                status: status_rx,
                handle,
                grace,
            });
        }

        info!(
            device,
            scheduled = loops.len(),
            skipped = skipped.len(),
            "telemetry collection started"
        );

        Self {
            shutdown_tx,
            loops,
            skipped,
        }
    }

    /// Number of running loops.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Telemetries that could not be scheduled.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Current status of every loop, in telemetry name order.
    pub fn statuses(&self) -> Vec<TelemetryStatus> {
        self.loops.iter().map(|l| l.status.borrow().clone()).collect()
    }

    /// Current status of one loop.
    pub fn status(&self, name: &str) -> Option<TelemetryStatus> {
        self.loops
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.status.borrow().clone())
    }

    /// Subscribe to status changes of one loop.
    pub fn watch(&self, name: &str) -> Option<watch::Receiver<TelemetryStatus>> {
        self.loops
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.status.clone())
    }

    /// Device phase derived from the current statuses.
    pub fn phase(&self) -> DevicePhase {
        DevicePhase::from_statuses(&self.statuses())
    }

    /// Raise the shutdown signal and wait for every loop to stop.
    ///
    /// Loops stop at their next suspension point; a tick in flight is allowed
    /// to finish within its grace period, after which the task is aborted.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        let joins = self.loops.into_iter().map(|l| async move {
            let mut handle = l.handle;
            if tokio::time::timeout(l.grace, &mut handle).await.is_err() {
                warn!(telemetry = %l.name, "telemetry loop exceeded shutdown grace period, aborting");
                handle.abort();
            }
        });
        futures::future::join_all(joins).await;

        info!("telemetry collection stopped");
    }
}

async fn run_loop(
    collector: TelemetryCollector,
    client: Arc<dyn ProtocolClient>,
    interval: Duration,
    status_tx: watch::Sender<TelemetryStatus>,
    mut shutdown: watch::Receiver<bool>,
) {
    let name = collector.telemetry().name.clone();
    let delay = collector.telemetry().initial_delay();

    tokio::select! {
        biased;
        _ = wait_for_shutdown(&mut shutdown) => {
            status_tx.send_modify(|s| s.state = LoopState::Stopped);
            return;
        }
        _ = tokio::time::sleep(delay) => {}
    }

    status_tx.send_modify(|s| s.state = LoopState::Running);
    debug!(telemetry = %name, interval_ms = interval.as_millis() as u64, "telemetry loop running");

    let command = Command::new(collector.telemetry().instruction.clone(), collector.telemetry().timeout());
    // Zero interval means a single tick.
    let mut ticker = (!interval.is_zero()).then(|| {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    loop {
        match ticker.as_mut() {
            Some(ticker) => {
                tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut shutdown) => break,
                    _ = ticker.tick() => {}
                }
            }
            None if *shutdown.borrow() => break,
            None => {}
        }

        let report = collector
            .run_cycle(|| async { CollectionOutcome::from(client.execute(&command).await) })
            .await;
        status_tx.send_modify(|s| s.record(report));

        if ticker.is_none() {
            debug!(telemetry = %name, "single-shot telemetry completed");
            // Stays Running until shutdown.
            wait_for_shutdown(&mut shutdown).await;
            break;
        }
    }

    status_tx.send_modify(|s| s.state = LoopState::Stopped);
    debug!(telemetry = %name, "telemetry loop stopped");
}

/// Resolves once shutdown is requested or the scheduler is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
