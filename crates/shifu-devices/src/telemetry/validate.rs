//! Telemetry configuration validation.
//!
//! Runs once, before any collection loop is started. The first violation
//! found is returned; errors are not aggregated.

use crate::config::{DeviceShifuConfig, TelemetryProperties, TelemetrySettings};
use crate::error::{ConfigError, DurationField};

/// Check that no telemetry duration is negative.
///
/// Defaults are checked first (interval, initial delay, timeout), then each
/// telemetry's own overrides in name order.
pub fn validate_telemetry_config(config: &DeviceShifuConfig) -> Result<(), ConfigError> {
    let Some(telemetries) = config.telemetries.as_ref() else {
        return Ok(());
    };

    if let Some(settings) = telemetries.telemetry_settings.as_ref() {
        if let Some(field) = first_negative(default_durations(settings)) {
            return Err(ConfigError::NegativeDefault(field));
        }
    }

    for (name, definition) in &telemetries.telemetries {
        if let Some(field) = first_negative(override_durations(&definition.properties)) {
            return Err(ConfigError::NegativeOverride {
                telemetry: name.clone(),
                field,
            });
        }
    }

    Ok(())
}

fn default_durations(settings: &TelemetrySettings) -> [(DurationField, Option<i64>); 3] {
    [
        (DurationField::Interval, settings.interval_ms),
        (DurationField::InitialDelay, settings.initial_delay_ms),
        (DurationField::Timeout, settings.timeout_ms),
    ]
}

fn override_durations(props: &TelemetryProperties) -> [(DurationField, Option<i64>); 3] {
    [
        (DurationField::Interval, props.interval_ms),
        (DurationField::InitialDelay, props.initial_delay_ms),
        (DurationField::Timeout, props.timeout_ms),
    ]
}

fn first_negative(fields: [(DurationField, Option<i64>); 3]) -> Option<DurationField> {
    fields
        .into_iter()
        .find(|(_, value)| matches!(value, Some(v) if *v < 0))
        .map(|(field, _)| field)
}
