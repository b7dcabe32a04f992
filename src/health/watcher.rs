//! Proxy watcher.
//!
//! Turns "can we fetch stats from the data-plane proxy within a bounded time"
//! into liveness and readiness answers. Each call to [`Watcher::probe`] is a
//! single attempt; there is no retry, backoff, or history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::config::ProbeConfig;
use crate::health::fetcher::{HttpStatsFetcher, ProbeError, ProbeResult, StatsFetcher};
use crate::observability::metrics;

/// Keeps the outcome of the most recent probe.
pub struct Watcher {
    fetcher: Arc<dyn StatsFetcher>,
    timeout: Duration,
    /// Did the last completed probe succeed? Starts false (fail closed).
    last_succeeded: AtomicBool,
}

impl Watcher {
    /// Create a watcher that probes the configured stats URL over HTTP.
    pub fn new(config: &ProbeConfig) -> Self {
        Self::with_fetcher(
            Arc::new(HttpStatsFetcher::new(config.stats_url.clone())),
            config.timeout(),
        )
    }

    /// Create a watcher with a specific fetcher. The fetcher is fixed for the
    /// watcher's lifetime.
    pub fn with_fetcher(fetcher: Arc<dyn StatsFetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            timeout,
            last_succeeded: AtomicBool::new(false),
        }
    }

    /// Probe the proxy once and record the outcome.
    ///
    /// Never fails: any error, timeout, cancellation or non-200 status is
    /// recorded as "not succeeded". Returns the recorded value.
    pub async fn probe(&self, cancel: &CancellationToken) -> bool {
        let outcome = tokio::select! {
            res = time::timeout(self.timeout, self.fetcher.fetch()) => {
                res.unwrap_or(Err(ProbeError::Timeout(self.timeout)))
            }
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        };

        let succeeded = match outcome {
            Ok(ProbeResult { status, body }) => {
                tracing::trace!(status, body_len = body.len(), "Fetched proxy stats");
                status == 200
            }
            Err(e) => {
                tracing::debug!(error = %e, "Could not fetch proxy stats");
                false
            }
        };

        // Only the finished outcome is stored; nothing is cleared up front.
        self.last_succeeded.store(succeeded, Ordering::SeqCst);
        metrics::record_probe(succeeded);

        succeeded
    }

    /// True iff the proxy should be considered alive.
    pub fn is_alive(&self) -> bool {
        self.last_succeeded.load(Ordering::SeqCst)
    }

    /// True iff the proxy should be considered ready. Ready currently means
    /// alive; callers use this entry point so the two can diverge later.
    pub fn is_ready(&self) -> bool {
        self.is_alive()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
