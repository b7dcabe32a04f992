//! HTTP front door.
//!
//! # Responsibilities
//! - Create Axum Router with the two probe handlers and the proxy fallback
//! - Trigger a fresh probe on every liveness/readiness request
//! - Forward everything else to the diagnostics origin
//! - Hand the router to the lifecycle controller for serving

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::HealthShimConfig;
use crate::health::Watcher;
use crate::http::proxy::{DiagProxy, ProxyError};
use crate::lifecycle::{self, LifecycleError};

/// Liveness probe path.
pub const CHECK_ALIVE_PATH: &str = "/ambassador/v0/check_alive";
/// Readiness probe path.
pub const CHECK_READY_PATH: &str = "/ambassador/v0/check_ready";

const ALIVE_BODY: &str = "Ambassador is alive and well\n";
const NOT_ALIVE_BODY: &str = "Ambassador is not alive\n";
const READY_BODY: &str = "Ambassador is ready and waiting\n";
const NOT_READY_BODY: &str = "Ambassador is not ready\n";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub watcher: Arc<Watcher>,
    pub proxy: Arc<DiagProxy>,
    /// Cancels in-flight probes when the server shuts down.
    pub shutdown: CancellationToken,
}

/// The shim's HTTP server.
pub struct FrontDoor {
    router: Router,
    shutdown: CancellationToken,
    grace_period: Duration,
}

impl FrontDoor {
    /// Create the front door around an existing watcher.
    pub fn new(
        config: &HealthShimConfig,
        watcher: Arc<Watcher>,
        shutdown: CancellationToken,
    ) -> Result<Self, ProxyError> {
        let proxy = Arc::new(DiagProxy::new(&config.diag)?);

        let state = AppState {
            watcher,
            proxy,
            shutdown: shutdown.clone(),
        };

        Ok(Self {
            router: build_router(state),
            shutdown,
            grace_period: config.shutdown.grace_period(),
        })
    }

    /// The fully layered router. Serving it needs `ConnectInfo<SocketAddr>`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until the shutdown token fires, then drain.
    pub async fn run(self, listener: TcpListener) -> Result<(), LifecycleError> {
        lifecycle::serve_with_grace(listener, self.router, self.shutdown, self.grace_period).await
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(CHECK_ALIVE_PATH, any(check_alive))
        .route(CHECK_READY_PATH, any(check_ready))
        .fallback(proxy_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn check_alive(State(state): State<AppState>) -> Response {
    // Probe first: if nothing else talks to the proxy, this is what
    // eventually marks it alive.
    state.watcher.probe(&state.shutdown).await;

    if state.watcher.is_alive() {
        (StatusCode::OK, ALIVE_BODY).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, NOT_ALIVE_BODY).into_response()
    }
}

async fn check_ready(State(state): State<AppState>) -> Response {
    // Same reasoning as liveness: a pod with only a readiness probe must
    // still drive probes, or it never becomes ready.
    state.watcher.probe(&state.shutdown).await;

    if state.watcher.is_ready() {
        (StatusCode::OK, READY_BODY).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, NOT_READY_BODY).into_response()
    }
}

async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    state.proxy.forward(peer, request).await
}
