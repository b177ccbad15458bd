//! Override-then-default resolution of telemetry settings.

use std::time::Duration;

use crate::config::{
    DEFAULT_TELEMETRY_TIMEOUT_MS, DeviceShifuTelemetries, TelemetryDefinition, TelemetrySettings,
};

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Override,
    Default,
}

/// Effective value of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Resolved<T> {
    pub fn is_defaulted(&self) -> bool {
        self.origin == Origin::Default
    }
}

/// Two-level lookup: the specific override, else the default, else absent.
pub fn resolve<T: Clone>(override_value: Option<&T>, default_value: Option<&T>) -> Option<Resolved<T>> {
    match (override_value, default_value) {
        (Some(value), _) => Some(Resolved {
            value: value.clone(),
            origin: Origin::Override,
        }),
        (None, Some(value)) => Some(Resolved {
            value: value.clone(),
            origin: Origin::Default,
        }),
        (None, None) => None,
    }
}

/// Fully resolved view of one telemetry definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTelemetry {
    pub name: String,
    pub instruction: String,
    pub push_to_server: Resolved<bool>,
    pub collection_service: Option<Resolved<String>>,
    pub interval_ms: Option<Resolved<i64>>,
    pub initial_delay_ms: Option<Resolved<i64>>,
    pub timeout_ms: Option<Resolved<i64>>,
}

impl ResolvedTelemetry {
    /// Resolve `definition` against the optional global `defaults`.
    pub fn new(name: &str, definition: &TelemetryDefinition, defaults: Option<&TelemetrySettings>) -> Self {
        let props = &definition.properties;
        let push = props.push_settings.as_ref();

        let push_to_server = resolve(
            push.and_then(|p| p.push_to_server.as_ref()),
            defaults.and_then(|d| d.push_to_server.as_ref()),
        )
        .unwrap_or(Resolved {
            value: false,
            origin: Origin::Default,
        });

        Self {
            name: name.to_string(),
            instruction: props.instruction.clone().unwrap_or_else(|| name.to_string()),
            push_to_server,
            collection_service: resolve(
                push.and_then(|p| p.collection_service.as_ref()),
                defaults.and_then(|d| d.collection_service.as_ref()),
            ),
            interval_ms: resolve(
                props.interval_ms.as_ref(),
                defaults.and_then(|d| d.interval_ms.as_ref()),
            ),
            initial_delay_ms: resolve(
                props.initial_delay_ms.as_ref(),
                defaults.and_then(|d| d.initial_delay_ms.as_ref()),
            ),
            timeout_ms: resolve(
                props.timeout_ms.as_ref(),
                defaults.and_then(|d| d.timeout_ms.as_ref()),
            ),
        }
    }

    /// Resolve every telemetry of a telemetry block, in name order.
    pub fn resolve_all(telemetries: &DeviceShifuTelemetries) -> Vec<ResolvedTelemetry> {
        let defaults = telemetries.telemetry_settings.as_ref();
        telemetries
            .telemetries
            .iter()
            .map(|(name, definition)| ResolvedTelemetry::new(name, definition, defaults))
            .collect()
    }

    /// Interval between ticks, `None` when neither override nor default exists.
    pub fn interval(&self) -> Option<Duration> {
        self.interval_ms.map(|r| millis(r.value))
    }

    /// Initial delay, zero when unset.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay_ms.map(|r| millis(r.value)).unwrap_or(Duration::ZERO)
    }

    /// Timeout bounding both acquisition and push. Unset or zero falls back
    /// to [`DEFAULT_TELEMETRY_TIMEOUT_MS`].
    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            Some(r) if r.value > 0 => millis(r.value),
            _ => millis(DEFAULT_TELEMETRY_TIMEOUT_MS),
        }
    }

    /// Collection service address when pushing is enabled.
    pub fn push_target(&self) -> Option<&str> {
        if !self.push_to_server.value {
            return None;
        }
        self.collection_service.as_ref().map(|r| r.value.as_str())
    }
}

// Negative values are rejected by validation before any conversion happens.
fn millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PushSettings;

    fn defaults() -> TelemetrySettings {
        TelemetrySettings {
            push_to_server: Some(true),
            collection_service: Some("push-endpoint-1".to_string()),
            interval_ms: Some(1000),
            initial_delay_ms: None,
            timeout_ms: Some(200),
        }
    }

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(
            resolve(Some(&1), Some(&2)),
            Some(Resolved { value: 1, origin: Origin::Override })
        );
        assert_eq!(
            resolve(None, Some(&2)),
            Some(Resolved { value: 2, origin: Origin::Default })
        );
        assert_eq!(resolve::<i64>(None, None), None);
    }

    #[test]
    fn test_definition_inherits_defaults() {
        let defaults = defaults();
        let definition = TelemetryDefinition::default();
        let resolved = ResolvedTelemetry::new("device_health", &definition, Some(&defaults));

        assert_eq!(resolved.instruction, "device_health");
        assert!(resolved.push_to_server.value);
        assert!(resolved.push_to_server.is_defaulted());
        assert_eq!(resolved.push_target(), Some("push-endpoint-1"));
        assert_eq!(resolved.interval(), Some(Duration::from_millis(1000)));
        assert_eq!(resolved.initial_delay(), Duration::ZERO);
        assert_eq!(resolved.timeout(), Duration::from_millis(200));
    }

    #[test]
    fn test_overrides_win() {
        let defaults = defaults();
        let mut definition = TelemetryDefinition::with_instruction("get_status")
            .interval_ms(50)
            .initial_delay_ms(5);
        definition.properties.push_settings = Some(PushSettings {
            push_to_server: Some(false),
            collection_service: None,
        });

        let resolved = ResolvedTelemetry::new("device_health", &definition, Some(&defaults));
        assert_eq!(resolved.instruction, "get_status");
        assert!(!resolved.push_to_server.value);
        assert_eq!(resolved.push_target(), None);
        assert_eq!(resolved.interval_ms.unwrap().origin, Origin::Override);
        assert_eq!(resolved.initial_delay(), Duration::from_millis(5));
        // collection service still inherited
        assert!(resolved.collection_service.unwrap().is_defaulted());
    }

    #[test]
    fn test_no_defaults() {
        let resolved = ResolvedTelemetry::new("t", &TelemetryDefinition::default(), None);
        assert!(!resolved.push_to_server.value);
        assert_eq!(resolved.interval(), None);
        assert_eq!(
            resolved.timeout(),
            Duration::from_millis(DEFAULT_TELEMETRY_TIMEOUT_MS as u64)
        );

        let zero = TelemetryDefinition::default().timeout_ms(0);
        let resolved = ResolvedTelemetry::new("t", &zero, None);
        assert_eq!(
            resolved.timeout(),
            Duration::from_millis(DEFAULT_TELEMETRY_TIMEOUT_MS as u64)
        );
    }
}
