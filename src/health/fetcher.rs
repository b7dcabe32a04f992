//! Statistics fetchers.
//!
//! # Responsibilities
//! - Perform a single GET against the proxy's statistics endpoint
//! - Return the status code and full body, or an error
//!
//! # Design Decisions
//! - The fetcher is a strategy injected into the watcher at construction
//! - The watcher owns the timeout; fetchers are cancelled by being dropped
//! - A partially read body is an error, never a partial result

use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

/// Outcome of one successful round trip to the statistics endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: u16,
    pub body: Bytes,
}

impl ProbeResult {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Everything that can go wrong while probing.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("error creating request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    #[error("error fetching stats: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("error reading body: {0}")]
    Body(#[from] axum::Error),

    #[error("stats request timed out after {0:?}")]
    Timeout(Duration),

    #[error("stats request cancelled by shutdown")]
    Cancelled,

    /// Used by fetchers that are not backed by HTTP.
    #[error("{0}")]
    Other(String),
}

/// Fetches the proxy's statistics.
#[async_trait]
pub trait StatsFetcher: Send + Sync {
    async fn fetch(&self) -> Result<ProbeResult, ProbeError>;
}

/// Default fetcher: plain HTTP GET against the proxy's stats URL.
pub struct HttpStatsFetcher {
    url: String,
    client: Client<HttpConnector, Body>,
}

impl HttpStatsFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl StatsFetcher for HttpStatsFetcher {
    async fn fetch(&self) -> Result<ProbeResult, ProbeError> {
        // Built per call so a bad URL shows up as an ordinary probe failure.
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.url.as_str())
            .header(header::USER_AGENT, "health-shim-probe")
            .body(Body::empty())?;

        let response = self.client.request(request).await?;
        let status = response.status().as_u16();
        let body = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX).await?;

        Ok(ProbeResult { status, body })
    }
}
