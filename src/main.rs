//! Health shim
//!
//! Sidecar front door for a data-plane proxy and its diagnostics service.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 HEALTH SHIM                  │
//!     Probe / Request     │  ┌─────────┐    ┌────────────┐               │
//!     ────────────────────┼─▶│   net   │───▶│    http    │               │
//!                         │  │ (IPv4)  │    │ front door │               │
//!                         │  └─────────┘    └─────┬──────┘               │
//!                         │          check_alive  │  anything else       │
//!                         │          check_ready  │                      │
//!                         │             ┌─────────┴─────────┐            │
//!                         │             ▼                   ▼            │
//!                         │      ┌─────────────┐     ┌─────────────┐     │
//!                         │      │   health    │     │    proxy    │─────┼──▶ diagnostics
//!                         │      │   watcher   │     │             │     │    (127.0.0.1:8004)
//!                         │      └──────┬──────┘     └─────────────┘     │
//!                         │             │ fetch                          │
//!                         └─────────────┼────────────────────────────────┘
//!                                       ▼
//!                              proxy stats endpoint
//!                              (localhost:8001/stats)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use health_shim::config::{load_config, HealthShimConfig};
use health_shim::lifecycle::{self, Shutdown};
use health_shim::observability::logging;

#[derive(Parser)]
#[command(name = "health-shim", version)]
#[command(about = "Liveness/readiness front door for a data-plane proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (IPv4 only).
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                // Logging is configured from this file, so it isn't up yet.
                eprintln!("health-shim: {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => HealthShimConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listener.bind_address = listen;
    }

    logging::init(&config.observability);

    tracing::info!("health-shim v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    lifecycle::spawn_signal_handler(&shutdown);

    match lifecycle::run(config, shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
