//! Metrics collection.
//!
//! # Metrics
//! - `healthshim_probes_total` (counter): probes by outcome
//! - `healthshim_proxy_alive` (gauge): 1=last probe succeeded, 0=otherwise
//! - `healthshim_diag_requests_total` (counter): proxied requests by status
//!
//! Recorded through the `metrics` facade; they go nowhere until the embedding
//! process installs a recorder.

pub fn record_probe(succeeded: bool) {
    let outcome = if succeeded { "success" } else { "failure" };
    metrics::counter!("healthshim_probes_total", "outcome" => outcome).increment(1);
    metrics::gauge!("healthshim_proxy_alive").set(if succeeded { 1.0 } else { 0.0 });
}

pub fn record_diag_request(status: u16) {
    metrics::counter!("healthshim_diag_requests_total", "status" => status.to_string())
        .increment(1);
}
