//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the IPv4 listener
//! - Build the watcher and the front door
//! - Serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound before anything else so a port conflict surfaces
//!   immediately

use std::sync::Arc;

use crate::config::HealthShimConfig;
use crate::health::Watcher;
use crate::http::FrontDoor;
use crate::lifecycle::{LifecycleError, Shutdown};
use crate::net::listener;

/// Run the shim until `shutdown` is triggered.
pub async fn run(config: HealthShimConfig, shutdown: Shutdown) -> Result<(), LifecycleError> {
    let listener = listener::bind(&config.listener).await?;

    tracing::info!(
        stats_url = %config.probe.stats_url,
        probe_timeout_ms = config.probe.timeout_ms,
        diag_origin = %config.diag.origin,
        "Configuration loaded"
    );

    let watcher = Arc::new(Watcher::new(&config.probe));
    let front_door = FrontDoor::new(&config, watcher, shutdown.token())?;

    front_door.run(listener).await
}
