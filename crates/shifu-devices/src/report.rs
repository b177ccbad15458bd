//! Out-of-band reporting of per-tick failures.
//!
//! Collection loops never return their failures to a caller; they hand them
//! to a [`Reporter`] instead. Reporting is fire-and-forget and must never
//! block or fail the calling loop.

use tokio::sync::broadcast;
use tracing::{error, warn};

/// Severity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Warning,
    Error,
}

/// A single report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEvent {
    pub level: ReportLevel,
    /// What was being done, e.g. `telemetry/device_health`
    pub context: String,
    pub message: String,
    pub timestamp: i64,
}

impl ReportEvent {
    pub fn new(level: ReportLevel, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            context: context.into(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Observability collaborator.
pub trait Reporter: Send + Sync {
    fn report(&self, event: ReportEvent);

    fn report_error(&self, context: &str, err: &dyn std::error::Error) {
        self.report(ReportEvent::new(ReportLevel::Error, context, err.to_string()));
    }

    fn report_warning(&self, context: &str, message: &str) {
        self.report(ReportEvent::new(ReportLevel::Warning, context, message));
    }
}

fn log_event(event: &ReportEvent) {
    match event.level {
        ReportLevel::Error => error!(context = %event.context, "{}", event.message),
        ReportLevel::Warning => warn!(context = %event.context, "{}", event.message),
    }
}

/// Reporter that only logs.
#[derive(Debug, Default, Clone)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: ReportEvent) {
        log_event(&event);
    }
}

/// Reporter that logs and fans reports out to subscribers.
///
/// Backed by a broadcast channel: sending never waits, and slow
/// subscribers lose the oldest reports rather than stalling a loop.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: broadcast::Sender<ReportEvent>,
}

impl ChannelReporter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChannelReporter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, event: ReportEvent) {
        log_event(&event);
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}
