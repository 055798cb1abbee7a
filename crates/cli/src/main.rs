//! padbridged - serial-to-DSU gamepad bridge daemon.
//!
//! Serves the DSU ("cemuhook") UDP protocol to emulator clients, backed by a
//! serial-attached microcontroller or a mock source for running without
//! hardware.

#![deny(static_mut_refs)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use padbridge_device::{DeviceSource, MockSource};
use padbridge_serial::{DEFAULT_BAUD, SerialBridge, SerialBridgeConfig};
use padbridge_server::{DEFAULT_PORT, DsuServer};

#[derive(Parser)]
#[command(name = "padbridged")]
#[command(about = "DSU virtual-gamepad server for serial-attached controllers")]
#[command(version)]
struct Cli {
    /// UDP port to serve DSU clients on
    #[arg(long, default_value_t = DEFAULT_PORT, env = "PADBRIDGE_PORT")]
    port: u16,

    /// Device backend to bridge
    #[arg(long, value_enum, default_value = "serial")]
    source: SourceKind,

    /// Serial port of the microcontroller
    #[arg(long, default_value = "/dev/ttyUSB0", env = "PADBRIDGE_SERIAL_PORT")]
    serial_port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD, env = "PADBRIDGE_BAUD")]
    baud: u32,

    /// Verbose logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Serial-attached microcontroller
    Serial,
    /// Built-in neutral source, no hardware required
    Mock,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let source: Arc<dyn DeviceSource> = match cli.source {
        SourceKind::Serial => Arc::new(SerialBridge::new(SerialBridgeConfig::new(
            cli.serial_port.clone(),
            cli.baud,
        ))),
        SourceKind::Mock => Arc::new(MockSource::new()),
    };
    source
        .start()
        .await
        .context("failed to start device source")?;

    let server = DsuServer::bind(cli.port, Arc::clone(&source))
        .await
        .context("failed to start DSU server")?;

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            shutdown.shutdown();
        }
    });

    server.run().await
}
