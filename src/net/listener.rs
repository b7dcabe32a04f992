//! IPv4 TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured address, IPv4 only
//! - Report bind failures as a distinct error
//!
//! # Design Decisions
//! - Binding an unspecified IPv6 address can end up v6-only inside some
//!   container networks, which fails readiness regardless of upstream health,
//!   so the listener refuses anything but IPv4

use std::net::{SocketAddr, SocketAddrV4};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Address could not be parsed.
    #[error("Invalid bind address `{0}`")]
    InvalidAddress(String),

    /// Address parsed but is not IPv4.
    #[error("Bind address `{0}` is not IPv4")]
    NotIpv4(SocketAddr),

    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },
}

/// Parse the configured bind address, accepting IPv4 only.
pub fn ipv4_bind_address(config: &ListenerConfig) -> Result<SocketAddrV4, ListenerError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|_| ListenerError::InvalidAddress(config.bind_address.clone()))?;

    match addr {
        SocketAddr::V4(v4) => Ok(v4),
        SocketAddr::V6(_) => Err(ListenerError::NotIpv4(addr)),
    }
}

/// Bind an IPv4 TCP listener on the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr = ipv4_bind_address(config)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}
