//! deviceShifu configuration model.
//!
//! These types mirror the keys of the ConfigMap mounted into every
//! deviceShifu pod (`driverProperties`, `instructions`, `telemetries`).
//! They are plain data: the configuration is loaded once, validated, and
//! then shared read-only behind an `Arc` for the lifetime of the shim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default location of the mounted ConfigMap.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/edgedevice/config";

/// Instruction timeout used when neither the instruction nor the
/// instruction settings declare one.
pub const DEFAULT_INSTRUCTION_TIMEOUT_MS: u64 = 3000;

/// Telemetry timeout used when neither the telemetry nor the defaults
/// declare one.
pub const DEFAULT_TELEMETRY_TIMEOUT_MS: i64 = 3000;

/// Full deviceShifu configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceShifuConfig {
    #[serde(default)]
    pub driver_properties: DriverProperties,
    #[serde(default)]
    pub instructions: DeviceShifuInstructions,
    #[serde(default)]
    pub telemetries: Option<DeviceShifuTelemetries>,
}

/// Driver metadata (informational).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverProperties {
    #[serde(default)]
    pub driver_sku: String,
    #[serde(default)]
    pub driver_image: String,
    #[serde(default)]
    pub driver_executable: Option<String>,
}

/// Instruction table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceShifuInstructions {
    #[serde(default)]
    pub instructions: BTreeMap<String, DeviceShifuInstruction>,
    #[serde(default)]
    pub instruction_settings: Option<InstructionSettings>,
}

/// Single named instruction understood by the device.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceShifuInstruction {
    /// Per-instruction timeout override
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Driver-specific properties forwarded untouched
    #[serde(default)]
    pub protocol_property_list: BTreeMap<String, String>,
}

/// Settings applied to all instructions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructionSettings {
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,
}

impl DeviceShifuInstructions {
    /// Check whether an instruction is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.instructions.contains_key(name)
    }

    /// Effective timeout of an instruction.
    pub fn timeout_ms(&self, name: &str) -> u64 {
        self.instructions
            .get(name)
            .and_then(|i| i.timeout_ms)
            .or_else(|| {
                self.instruction_settings
                    .as_ref()
                    .and_then(|s| s.default_timeout_ms)
            })
            .unwrap_or(DEFAULT_INSTRUCTION_TIMEOUT_MS)
    }
}

/// Telemetry block: global defaults plus named telemetries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceShifuTelemetries {
    #[serde(default)]
    pub telemetry_settings: Option<TelemetrySettings>,
    #[serde(default)]
    pub telemetries: BTreeMap<String, TelemetryDefinition>,
}

/// Global telemetry defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySettings {
    #[serde(default, rename = "telemetryDefaultPushToServer")]
    pub push_to_server: Option<bool>,
    #[serde(default, rename = "telemetryDefaultCollectionService")]
    pub collection_service: Option<String>,
    #[serde(default, rename = "telemetryUpdateIntervalInMilliseconds")]
    pub interval_ms: Option<i64>,
    #[serde(default, rename = "telemetryInitialDelayInMilliseconds")]
    pub initial_delay_ms: Option<i64>,
    #[serde(default, rename = "telemetryTimeoutInMilliseconds")]
    pub timeout_ms: Option<i64>,
}

/// One named telemetry channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetryDefinition {
    #[serde(default)]
    pub properties: TelemetryProperties,
}

/// Per-telemetry overrides. Unset fields inherit from [`TelemetrySettings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryProperties {
    /// Instruction executed on every tick; defaults to the telemetry name
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub initial_delay_ms: Option<i64>,
    #[serde(default)]
    pub interval_ms: Option<i64>,
    #[serde(default)]
    pub timeout_ms: Option<i64>,
    #[serde(default)]
    pub push_settings: Option<PushSettings>,
}

/// Per-telemetry push override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PushSettings {
    #[serde(default, rename = "telemetryPushToServer")]
    pub push_to_server: Option<bool>,
    #[serde(default, rename = "telemetryCollectionService")]
    pub collection_service: Option<String>,
}

impl TelemetryDefinition {
    /// Builder-style constructor used by callers assembling configs in code.
    pub fn with_instruction(instruction: impl Into<String>) -> Self {
        Self {
            properties: TelemetryProperties {
                instruction: Some(instruction.into()),
                ..Default::default()
            },
        }
    }

    /// Set the interval override.
    pub fn interval_ms(mut self, ms: i64) -> Self {
        self.properties.interval_ms = Some(ms);
        self
    }

    /// Set the initial delay override.
    pub fn initial_delay_ms(mut self, ms: i64) -> Self {
        self.properties.initial_delay_ms = Some(ms);
        self
    }

    /// Set the timeout override.
    pub fn timeout_ms(mut self, ms: i64) -> Self {
        self.properties.timeout_ms = Some(ms);
        self
    }

    /// Set the push override.
    pub fn push(mut self, push_to_server: bool, collection_service: Option<&str>) -> Self {
        self.properties.push_settings = Some(PushSettings {
            push_to_server: Some(push_to_server),
            collection_service: collection_service.map(str::to_string),
        });
        self
    }
}

/// Protocol spoken by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "HTTPCommandline")]
    HttpCommandline,
    #[serde(rename = "MQTT")]
    Mqtt,
    #[serde(rename = "OPCUA")]
    Opcua,
    #[serde(rename = "Socket")]
    Socket,
    #[serde(rename = "PLC4X")]
    Plc4x,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::HttpCommandline => "HTTPCommandline",
            Protocol::Mqtt => "MQTT",
            Protocol::Opcua => "OPCUA",
            Protocol::Socket => "Socket",
            Protocol::Plc4x => "PLC4X",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HTTP" => Ok(Protocol::Http),
            "HTTPCOMMANDLINE" => Ok(Protocol::HttpCommandline),
            "MQTT" => Ok(Protocol::Mqtt),
            "OPCUA" => Ok(Protocol::Opcua),
            "SOCKET" => Ok(Protocol::Socket),
            "PLC4X" => Ok(Protocol::Plc4x),
            other => Err(format!("unknown protocol: {}", other)),
        }
    }
}

/// The part of the EdgeDevice resource the shim needs to reach its device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDeviceSpec {
    pub protocol: Protocol,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetries_deserialize_configmap_keys() {
        let json = serde_json::json!({
            "telemetrySettings": {
                "telemetryDefaultPushToServer": true,
                "telemetryDefaultCollectionService": "push-endpoint-1",
                "telemetryUpdateIntervalInMilliseconds": 1000,
                "telemetryTimeoutInMilliseconds": 500
            },
            "telemetries": {
                "device_health": {
                    "properties": {
                        "instruction": "get_status",
                        "initialDelayMs": 10,
                        "pushSettings": {
                            "telemetryPushToServer": false
                        }
                    }
                }
            }
        });

        let telemetries: DeviceShifuTelemetries = serde_json::from_value(json).unwrap();
        let settings = telemetries.telemetry_settings.as_ref().unwrap();
        assert_eq!(settings.push_to_server, Some(true));
        assert_eq!(settings.interval_ms, Some(1000));
        assert_eq!(settings.initial_delay_ms, None);

        let health = &telemetries.telemetries["device_health"].properties;
        assert_eq!(health.instruction.as_deref(), Some("get_status"));
        assert_eq!(health.initial_delay_ms, Some(10));
        assert_eq!(
            health.push_settings.as_ref().unwrap().push_to_server,
            Some(false)
        );
    }

    #[test]
    fn test_instruction_timeout_fallback() {
        let mut instructions = DeviceShifuInstructions::default();
        instructions.instructions.insert(
            "fast".to_string(),
            DeviceShifuInstruction {
                timeout_ms: Some(100),
                ..Default::default()
            },
        );
        instructions
            .instructions
            .insert("slow".to_string(), DeviceShifuInstruction::default());

        assert_eq!(instructions.timeout_ms("fast"), 100);
        assert_eq!(instructions.timeout_ms("slow"), DEFAULT_INSTRUCTION_TIMEOUT_MS);

        instructions.instruction_settings = Some(InstructionSettings {
            default_timeout_ms: Some(750),
        });
        assert_eq!(instructions.timeout_ms("slow"), 750);
        assert!(instructions.contains("fast"));
        assert!(!instructions.contains("missing"));
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("OPCUA".parse::<Protocol>().unwrap(), Protocol::Opcua);
        assert!("zigbee".parse::<Protocol>().is_err());
    }
}
