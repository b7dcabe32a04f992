//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use health_shim::config::HealthShimConfig;
use health_shim::health::{ProbeError, ProbeResult, StatsFetcher, Watcher};
use health_shim::http::FrontDoor;

pub const MARKER_HEADER: &str = "x-ambassador-diag-ip";

/// Fetcher that always answers with the given status.
pub struct StaticFetcher(pub u16);

#[async_trait]
impl StatsFetcher for StaticFetcher {
    async fn fetch(&self) -> Result<ProbeResult, ProbeError> {
        Ok(ProbeResult::new(self.0, "server.live: 1\n"))
    }
}

/// Fetcher that always fails to connect.
pub struct FailingFetcher;

#[async_trait]
impl StatsFetcher for FailingFetcher {
    async fn fetch(&self) -> Result<ProbeResult, ProbeError> {
        Err(ProbeError::Other("connection refused".into()))
    }
}

/// Fetcher that counts calls and answers 200.
#[derive(Clone, Default)]
pub struct CountingFetcher(pub Arc<AtomicUsize>);

impl CountingFetcher {
    pub fn calls(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsFetcher for CountingFetcher {
    async fn fetch(&self) -> Result<ProbeResult, ProbeError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(ProbeResult::new(200, ""))
    }
}

/// Echo handler standing in for the diagnostics service.
///
/// Reports what it saw through `x-seen-*` response headers and echoes the
/// request body. `/teapot` answers 418 to check error passthrough.
async fn echo(delay: Duration, request: Request<Body>) -> Response {
    tokio::time::sleep(delay).await;

    if request.uri().path() == "/teapot" {
        return (StatusCode::IM_A_TEAPOT, "short and stout\n").into_response();
    }

    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_default();
    let marker = request
        .headers()
        .get(MARKER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .unwrap();

    let mut response = Response::builder()
        .header("x-seen-method", method)
        .header("x-seen-path", path);
    if let Some(marker) = marker {
        response = response.header("x-seen-marker", marker);
    }
    response.body(Body::from(body)).unwrap()
}

/// Start a diagnostics stub on an ephemeral port.
pub async fn start_diag_stub(delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(move |request: Request<Body>| echo(delay, request));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// Config pointing the diagnostics proxy at `diag_addr`.
pub fn config_for(diag_addr: SocketAddr) -> HealthShimConfig {
    let mut config = HealthShimConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.diag.origin = format!("http://{}/", diag_addr);
    config
}

/// Front door with the given fetcher and diagnostics origin.
pub fn front_door(
    fetcher: impl StatsFetcher + 'static,
    config: &HealthShimConfig,
    shutdown: CancellationToken,
) -> FrontDoor {
    let watcher = Arc::new(Watcher::with_fetcher(
        Arc::new(fetcher),
        config.probe.timeout(),
    ));
    FrontDoor::new(config, watcher, shutdown).unwrap()
}

/// Address nobody listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
