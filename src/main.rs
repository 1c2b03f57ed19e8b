//! LED relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                    LED RELAY                     │
//!                       │                                                  │
//!   POST /led/{state}   │  ┌─────────┐    ┌──────────────┐                 │
//!   ────────────────────┼─▶│ control │───▶│LedController │──set──▶ LedState│
//!                       │  └─────────┘    └──────┬───────┘                 │
//!                       │                        │ broadcast               │
//!                       │                        ▼                         │
//!   WS /ws              │  ┌─────────┐    ┌──────────────┐                 │
//!   ◀───────────────────┼──│websocket│◀───│  Subscriber  │                 │
//!     "LED is on/off"   │  │  task   │    │   Registry   │                 │
//!                       │  └─────────┘    └──────────────┘                 │
//!                       │                                                  │
//!                       │  config · observability · lifecycle             │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use led_relay::config::{load_config, LedConfig};
use led_relay::lifecycle::signals;
use led_relay::observability::{logging, metrics};
use led_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "led-relay")]
#[command(about = "Toggle an LED over HTTP and push its state over WebSocket", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => LedConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("led-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_subscribers = config.subscribers.max_subscribers,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, shutdown);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
