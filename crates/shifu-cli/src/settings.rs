//! Process settings: command-line flags layered over an optional TOML file.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Deserialize;

use shifu_api::ShifuMetadata;
use shifu_devices::{DEFAULT_CONFIG_PATH, EdgeDeviceSpec, Protocol};

const DEFAULT_NAMESPACE: &str = "deviceshifu";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// deviceShifu - telemetry and instruction shim for one edge device.
#[derive(Parser, Debug, Default)]
#[command(name = "deviceshifu")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Name of the deviceShifu.
    #[arg(long, env = "EDGEDEVICE_NAME")]
    pub name: Option<String>,

    /// Namespace of the EdgeDevice.
    #[arg(long, env = "EDGEDEVICE_NAMESPACE")]
    pub namespace: Option<String>,

    /// Directory holding the mounted ConfigMap.
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Device address.
    #[arg(long)]
    pub address: Option<String>,

    /// Device protocol (HTTP, MQTT, OPCUA, ...).
    #[arg(long)]
    pub protocol: Option<String>,

    /// Host to bind to.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// TOML settings file.
    #[arg(short, long)]
    pub settings: Option<PathBuf>,
}

/// Contents of the settings file. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShifuSettings {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub config_path: Option<PathBuf>,
    pub address: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ShifuSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }
}

/// Everything the process needs to start.
#[derive(Debug)]
pub struct RunSettings {
    pub metadata: ShifuMetadata,
    pub listen: SocketAddr,
}

impl RunSettings {
    /// Merge flags over the file over built-in defaults.
    pub fn resolve(args: Args, file: ShifuSettings) -> Result<Self> {
        let name = args.name.or(file.name).unwrap_or_default();
        let namespace = args
            .namespace
            .or(file.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let config_path = args
            .config_path
            .or(file.config_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let address = args
            .address
            .or(file.address)
            .ok_or_else(|| anyhow!("device address is required (--address or settings file)"))?;
        let protocol: Protocol = match args.protocol.or(file.protocol) {
            Some(p) => p.parse().map_err(|e: String| anyhow!(e))?,
            None => Protocol::Http,
        };

        let host = args.host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let listen: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| anyhow!("Invalid address: {}:{}", host, port))?;

        let metadata = ShifuMetadata::new(name, namespace, EdgeDeviceSpec { protocol, address })
            .with_config_path(config_path);

        Ok(Self { metadata, listen })
    }
}
