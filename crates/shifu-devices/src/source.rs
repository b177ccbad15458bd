//! Configuration sources.
//!
//! The reference source reads a ConfigMap mounted as a directory, one file
//! per key. Each key holds a JSON document.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{DeviceShifuConfig, DeviceShifuInstructions, DeviceShifuTelemetries, DriverProperties};
use crate::error::ConfigError;

/// ConfigMap key holding driver metadata.
pub const DRIVER_PROPERTIES_KEY: &str = "driverProperties";
/// ConfigMap key holding the instruction table.
pub const INSTRUCTIONS_KEY: &str = "instructions";
/// ConfigMap key holding the telemetry block.
pub const TELEMETRIES_KEY: &str = "telemetries";

/// Loads a [`DeviceShifuConfig`].
pub trait ConfigSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<DeviceShifuConfig, ConfigError>;
}

/// Reads a mounted ConfigMap directory.
///
/// The directory must exist. Missing keys fall back to their defaults,
/// present keys must parse.
#[derive(Debug, Default, Clone)]
pub struct ConfigMapSource;

impl ConfigSource for ConfigMapSource {
    fn load(&self, path: &Path) -> Result<DeviceShifuConfig, ConfigError> {
        if !path.is_dir() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let driver_properties: Option<DriverProperties> = read_key(path, DRIVER_PROPERTIES_KEY)?;
        let instructions: Option<DeviceShifuInstructions> = read_key(path, INSTRUCTIONS_KEY)?;
        let telemetries: Option<DeviceShifuTelemetries> = read_key(path, TELEMETRIES_KEY)?;

        debug!(
            path = %path.display(),
            telemetries = telemetries.as_ref().map(|t| t.telemetries.len()).unwrap_or(0),
            "loaded deviceShifu configuration"
        );

        Ok(DeviceShifuConfig {
            driver_properties: driver_properties.unwrap_or_default(),
            instructions: instructions.unwrap_or_default(),
            telemetries,
        })
    }
}

fn read_key<T: DeserializeOwned>(dir: &Path, key: &str) -> Result<Option<T>, ConfigError> {
    let file = dir.join(key);
    let content = match std::fs::read_to_string(&file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Io { path: file, source }),
    };

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: dir.to_path_buf(),
            key: key.to_string(),
            reason: e.to_string(),
        })
}
