//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Probe request arrives at the front door
//!     → watcher.rs (Watcher::probe, bounded by timeout + shutdown token)
//!     → fetcher.rs (one GET against the proxy's stats endpoint)
//!     → status 200? → last_succeeded = true, otherwise false
//!     → is_alive() / is_ready() read the stored value
//! ```
//!
//! # Design Decisions
//! - Probing is active and on demand; nothing runs in the background
//! - Fail closed: unhealthy until the first successful probe
//! - Last completed probe wins; no hysteresis, no history
//! - The fetcher is a strategy fixed at construction

pub mod fetcher;
pub mod watcher;

pub use fetcher::{HttpStatsFetcher, ProbeError, ProbeResult, StatsFetcher};
pub use watcher::Watcher;
