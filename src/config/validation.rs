//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Listener must be IPv4
//! - Origins must be plain `http` URLs with a host
//! - Value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HealthShimConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::HealthShimConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.bind_address `{0}` is not IPv4")]
    NotIpv4(String),

    #[error("{field} `{value}` is not a valid http URL: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("probe.timeout_ms must be greater than zero")]
    ZeroProbeTimeout,

    #[error("diag.local_marker_header `{0}` is not a valid header name")]
    InvalidHeaderName(String),
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &HealthShimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.bind_address.parse::<SocketAddr>() {
        Ok(addr) if !addr.is_ipv4() => {
            errors.push(ValidationError::NotIpv4(config.listener.bind_address.clone()));
        }
        Ok(_) => {}
        Err(_) => {
            errors.push(ValidationError::InvalidBindAddress(
                config.listener.bind_address.clone(),
            ));
        }
    }

    if let Err(e) = check_http_url("probe.stats_url", &config.probe.stats_url) {
        errors.push(e);
    }
    if let Err(e) = check_http_url("diag.origin", &config.diag.origin) {
        errors.push(e);
    }

    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }

    if HeaderName::from_bytes(config.diag.local_marker_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            config.diag.local_marker_header.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
