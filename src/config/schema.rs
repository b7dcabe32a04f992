//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shim.
//! All types derive `Deserialize` from config files, and
//! every default matches the reference deployment next to the data-plane proxy.

use serde::Deserialize;
use std::time::Duration;

/// Root configuration for the health shim.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HealthShimConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// How the proxy's statistics endpoint is probed.
    pub probe: ProbeConfig,

    /// Where non-probe traffic is forwarded.
    pub diag: DiagConfig,

    /// Graceful shutdown bounds.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address. Must be an IPv4 socket address (e.g., "0.0.0.0:8877").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8877".to_string(),
        }
    }
}

/// Statistics probe configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// URL of the proxy's statistics endpoint.
    pub stats_url: String,

    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            stats_url: "http://localhost:8001/stats".to_string(),
            // The proxy answers in well under 100ms; this is only a ceiling.
            timeout_ms: 2000,
        }
    }
}

/// Diagnostics origin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagConfig {
    /// Origin that receives every non-probe request. Only its scheme and
    /// authority are used.
    pub origin: String,

    /// Header set to `127.0.0.1` when the caller is on loopback.
    pub local_marker_header: String,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:8004/".to_string(),
            local_marker_header: "X-Ambassador-Diag-IP".to_string(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight requests may run after shutdown begins.
    pub grace_period_secs: u64,
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 10,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
