//! Error types shared by the device shim core.

use std::path::PathBuf;

use thiserror::Error;

/// Duration fields of the telemetry configuration, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationField {
    Interval,
    InitialDelay,
    Timeout,
}

impl DurationField {
    /// Human-readable name used in operator-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            DurationField::Interval => "interval",
            DurationField::InitialDelay => "initial delay",
            DurationField::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for DurationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration errors. Fatal to bootstrap, never raised by a running loop.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A default telemetry duration is negative
    #[error("telemetry {0} mustn't be negative number")]
    NegativeDefault(DurationField),

    /// A telemetry's own duration override is negative
    #[error("telemetry {field} of \"{telemetry}\" mustn't be negative number")]
    NegativeOverride {
        telemetry: String,
        field: DurationField,
    },

    /// The configuration source does not exist
    #[error("configuration not found at {}", path.display())]
    NotFound { path: PathBuf },

    /// The configuration source exists but could not be parsed
    #[error("failed to parse {key} at {}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        key: String,
        reason: String,
    },

    /// Any other I/O failure while reading the source
    #[error("failed to read configuration at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Whether the error means the expected configuration is missing or corrupt,
    /// as opposed to a generic read failure.
    pub fn is_missing_or_corrupt(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. } | ConfigError::Parse { .. })
    }
}

/// Errors raised while talking to the device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Device unreachable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Device answered with something unusable
    #[error("Communication error: {0}")]
    Communication(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Instruction is not declared in the configuration
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    /// No driver is available for the protocol
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// Other error
    #[error("Device error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Errors raised when delivering telemetry to a collection service.
#[derive(Debug, Error)]
pub enum PushError {
    /// Request could not be sent or timed out
    #[error("push to {address} failed: {reason}")]
    Transport { address: String, reason: String },

    /// Collection service answered with a non-success status
    #[error("push to {address} rejected with status {status}")]
    Rejected { address: String, status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_default_messages() {
        assert_eq!(
            ConfigError::NegativeDefault(DurationField::Interval).to_string(),
            "telemetry interval mustn't be negative number"
        );
        assert_eq!(
            ConfigError::NegativeDefault(DurationField::InitialDelay).to_string(),
            "telemetry initial delay mustn't be negative number"
        );
        assert_eq!(
            ConfigError::NegativeDefault(DurationField::Timeout).to_string(),
            "telemetry timeout mustn't be negative number"
        );
    }

    #[test]
    fn test_negative_override_names_telemetry() {
        let err = ConfigError::NegativeOverride {
            telemetry: "device_health".to_string(),
            field: DurationField::Timeout,
        };
        assert_eq!(
            err.to_string(),
            "telemetry timeout of \"device_health\" mustn't be negative number"
        );
    }

    #[test]
    fn test_missing_or_corrupt() {
        let missing = ConfigError::NotFound {
            path: PathBuf::from("/etc/edgedevice/config"),
        };
        assert!(missing.is_missing_or_corrupt());

        let io = ConfigError::Io {
            path: PathBuf::from("/etc/edgedevice/config"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!io.is_missing_or_corrupt());
    }
}
