//! Bootstrap errors.

use std::path::PathBuf;

use shifu_devices::{ConfigError, DeviceError};
use thiserror::Error;

/// Why a deviceShifu could not be created. Every variant is a
/// configuration problem: no instance and no router exist afterwards.
#[derive(Debug, Error)]
pub enum ShifuError {
    #[error("DeviceShifu's name can't be empty")]
    EmptyName,

    #[error("Error parsing ConfigMap at {}", path.display())]
    ConfigMap {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    InvalidConfig(ConfigError),

    #[error("failed to create protocol client: {0}")]
    ProtocolClient(#[source] DeviceError),
}
