//! Health shim library.
//!
//! Answers liveness/readiness probes for a data-plane proxy by fetching its
//! statistics endpoint on demand, and reverse-proxies every other request to
//! a co-located diagnostics service.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::HealthShimConfig;
pub use health::Watcher;
pub use http::FrontDoor;
pub use lifecycle::{LifecycleError, Shutdown};
