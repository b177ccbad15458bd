//! deviceShifu process entry point.

mod settings;
mod shutdown;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shifu_api::{ShifuDeps, new_device_shifu};

use settings::{Args, RunSettings, ShifuSettings};
use shutdown::shutdown_signal;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let file = match args.settings.as_deref() {
        Some(path) => ShifuSettings::load(path)?,
        None => ShifuSettings::default(),
    };
    let run = RunSettings::resolve(args, file)?;

    let (shifu, router) = new_device_shifu(run.metadata, ShifuDeps::default())?;
    let scheduled = shifu.start_telemetry_collection().await;
    info!(device = %shifu.name(), telemetries = scheduled, "telemetry collection started");

    let listener = tokio::net::TcpListener::bind(run.listen).await?;
    info!(addr = %run.listen, "deviceShifu listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shifu.stop().await;
    info!(device = %shifu.name(), "deviceShifu stopped");
    Ok(())
}

fn init_logging() {
    // JSON output for container environments
    let json_logging = std::env::var("SHIFU_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("deviceshifu=info")
            .add_directive(tracing::Level::INFO.into())
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }
}
