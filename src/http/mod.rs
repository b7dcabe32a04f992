//! HTTP front door subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (IPv4)
//!     → server.rs (Axum router)
//!         /ambassador/v0/check_alive → Watcher::probe → is_alive → 200/503
//!         /ambassador/v0/check_ready → Watcher::probe → is_ready → 200/503
//!         anything else             → proxy.rs → diagnostics origin
//!     → Send to client
//! ```

pub mod proxy;
pub mod server;

pub use proxy::{DiagProxy, ProxyError};
pub use server::{build_router, AppState, FrontDoor, CHECK_ALIVE_PATH, CHECK_READY_PATH};
