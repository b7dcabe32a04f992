//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! listener.rs (IPv4 bind)
//!     → tokio TcpListener
//!     → handed to axum::serve by the lifecycle controller
//! ```

pub mod listener;

pub use listener::ListenerError;
