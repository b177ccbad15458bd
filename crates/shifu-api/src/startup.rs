//! deviceShifu bootstrap.
//!
//! Turns a name, an EdgeDevice description and a configuration source into
//! a validated [`DeviceShifu`] plus the router that exposes it. Everything
//! the bootstrap needs is passed in; nothing is read from the environment.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tracing::{error, info};

use shifu_devices::{
    ConfigMapSource, ConfigSource, DEFAULT_CONFIG_PATH, DefaultClientFactory, EdgeDeviceSpec,
    HttpPushSink, ProtocolClientFactory, PushSink, Reporter, TracingReporter,
    validate_telemetry_config,
};

use crate::error::ShifuError;
use crate::server::create_router;
use crate::shifu::DeviceShifu;

/// Identity of the shim and where its configuration lives.
#[derive(Debug, Clone)]
pub struct ShifuMetadata {
    pub name: String,
    pub namespace: String,
    pub config_path: PathBuf,
    pub edge_device: EdgeDeviceSpec,
}

impl ShifuMetadata {
    /// Metadata with the default ConfigMap mount path.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, edge_device: EdgeDeviceSpec) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            edge_device,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }
}

/// Collaborators used by the shim.
#[derive(Clone)]
pub struct ShifuDeps {
    pub config_source: Arc<dyn ConfigSource>,
    pub client_factory: Arc<dyn ProtocolClientFactory>,
    pub push_sink: Arc<dyn PushSink>,
    pub reporter: Arc<dyn Reporter>,
}

impl Default for ShifuDeps {
    fn default() -> Self {
        Self {
            config_source: Arc::new(ConfigMapSource),
            client_factory: Arc::new(DefaultClientFactory),
            push_sink: Arc::new(HttpPushSink::new()),
            reporter: Arc::new(TracingReporter),
        }
    }
}

impl ShifuDeps {
    pub fn with_config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.config_source = source;
        self
    }

    pub fn with_client_factory(mut self, factory: Arc<dyn ProtocolClientFactory>) -> Self {
        self.client_factory = factory;
        self
    }

    pub fn with_push_sink(mut self, sink: Arc<dyn PushSink>) -> Self {
        self.push_sink = sink;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

/// Create a deviceShifu and its request router.
///
/// Fails without creating anything when the name is empty, the
/// configuration cannot be loaded, the telemetry settings are invalid, or
/// no protocol client can be built.
///
/// The telemetry loops are launched by
/// [`DeviceShifu::start_telemetry_collection`] once this has succeeded, so
/// bootstrap itself spawns no tasks and needs no runtime. A caller can bind
/// its listener first and only then start polling the device.
pub fn new_device_shifu(
    meta: ShifuMetadata,
    deps: ShifuDeps,
) -> Result<(Arc<DeviceShifu>, Router), ShifuError> {
    if meta.name.is_empty() {
        error!("DeviceShifu's name can't be empty");
        return Err(ShifuError::EmptyName);
    }

    let config = deps.config_source.load(&meta.config_path).map_err(|source| {
        error!(path = %meta.config_path.display(), error = %source, "Error parsing ConfigMap");
        ShifuError::ConfigMap {
            path: meta.config_path.clone(),
            source,
        }
    })?;

    validate_telemetry_config(&config).map_err(|e| {
        error!(device = %meta.name, error = %e, "invalid telemetry configuration");
        ShifuError::InvalidConfig(e)
    })?;

    let client = deps
        .client_factory
        .create(&meta.edge_device)
        .map_err(ShifuError::ProtocolClient)?;

    info!(
        device = %meta.name,
        namespace = %meta.namespace,
        protocol = %meta.edge_device.protocol,
        address = %meta.edge_device.address,
        "deviceShifu created"
    );

    let shifu = Arc::new(DeviceShifu::new(
        meta.name,
        meta.namespace,
        meta.edge_device,
        config,
        client,
        deps.push_sink,
        deps.reporter,
    ));
    let router = create_router(shifu.clone());

    Ok((shifu, router))
}
