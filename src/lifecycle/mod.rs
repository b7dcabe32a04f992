//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind IPv4 listener → Build watcher + front door → Serve
//!
//! Shutdown (shutdown.rs):
//!     Token cancelled → Stop accepting → Drain in-flight (bounded) → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Cancel the shutdown token
//! ```
//!
//! # Design Decisions
//! - Fail fast: bind failure is fatal, never retried
//! - Shutdown has a deadline; missing it is fatal too
//! - Fatal conditions are returned as `LifecycleError`, `main` turns them
//!   into a non-zero exit

pub mod shutdown;
pub mod signals;
pub mod startup;

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::http::ProxyError;
use crate::net::ListenerError;

pub use shutdown::{serve_with_grace, Shutdown};
pub use signals::{shutdown_signal, spawn_signal_handler};
pub use startup::run;

/// Conditions that end the process.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("could not start listener: {0}")]
    Bind(#[from] ListenerError),

    #[error("could not set up diagnostics proxy: {0}")]
    Proxy(#[from] ProxyError),

    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),
}
