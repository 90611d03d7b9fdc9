//! Room display server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                ROOM DISPLAY                  │
//!                      │                                              │
//!     Browser          │  ┌─────────┐   ┌──────────┐   ┌──────────┐   │
//!     ─────────────────┼─▶│  http   │──▶│ security │──▶│ handlers │   │
//!                      │  │ server  │   │allow-list│   │ / /data  │   │
//!                      │  └─────────┘   └──────────┘   │/instabook│   │
//!                      │                               └────┬─────┘   │
//!                      │                                    ▼         │
//!                      │                           ┌────────────────┐ │
//!                      │                           │    provider    │─┼──▶ Outlook
//!                      │                           │ demo | outlook │ │
//!                      │                           └────────────────┘ │
//!                      │  config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use room_display::config::load_from_env;
use room_display::lifecycle::{shutdown_on_signal, Shutdown};
use room_display::observability::{logging, metrics};
use room_display::{build_provider, HttpServer, ServerMode};

#[derive(Parser)]
#[command(name = "room-display")]
#[command(about = "Meeting room availability display with InstaBook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server
    Runserver,
    /// Run the server in production mode
    Production,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mode = match cli.command {
        Commands::Runserver => ServerMode::Debug,
        Commands::Production => ServerMode::Production,
    };

    logging::init(mode);
    tracing::info!("room-display v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(
        load_from_env().inspect_err(|e| tracing::error!(error = %e, "Invalid configuration"))?,
    );

    tracing::info!(
        bind_address = %config.server.bind_address(),
        demo_mode = config.demo_mode,
        allowed_ips = config.security.allowed_ips.len(),
        instabook_times = ?config.instabook.times,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        let addr: SocketAddr = addr.parse()?;
        metrics::init_metrics(addr)?;
    }

    let provider = build_provider(&config)?;

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        provider = provider.name(),
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, provider, mode);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
