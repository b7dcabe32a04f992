//! Shutdown coordination and bounded draining.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::ConnectInfo, http::Request, Router};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::lifecycle::LifecycleError;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Coordinator for graceful shutdown.
///
/// Wraps a cancellation token that the server, in-flight probes and the
/// signal handler all share.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that observes the shutdown signal.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }
}

/// Serve `router` on `listener` until `shutdown` fires, then give in-flight
/// requests up to `grace_period` to finish.
///
/// Every connection runs in a task owned by this function. Once the token is
/// cancelled the listener is dropped and each connection is asked to finish
/// its current request; connections still open when the grace period runs out
/// are aborted and [`LifecycleError::ShutdownTimeout`] is returned.
pub async fn serve_with_grace(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
    grace_period: Duration,
) -> Result<(), LifecycleError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "HTTP server starting");
    }

    let mut connections = JoinSet::new();

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            },
            _ = shutdown.cancelled() => break,
        };

        // Reap finished connections so the set only holds live ones.
        while connections.try_join_next().is_some() {}

        connections.spawn(serve_connection(stream, peer, router.clone(), shutdown.clone()));
    }

    drop(listener);
    tracing::info!(
        grace_period = ?grace_period,
        open_connections = connections.len(),
        "Shutdown requested, draining in-flight requests"
    );

    let drained = time::timeout(grace_period, async {
        while connections.join_next().await.is_some() {}
    })
    .await
    .is_ok();

    if drained {
        tracing::info!("HTTP server stopped");
        Ok(())
    } else {
        tracing::warn!(
            open_connections = connections.len(),
            "Grace period expired, closing remaining connections"
        );
        connections.shutdown().await;
        Err(LifecycleError::ShutdownTimeout(grace_period))
    }
}

/// Serve one connection, switching to graceful close once `shutdown` fires.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    shutdown: CancellationToken,
) {
    // Same extension axum's own `into_make_service_with_connect_info` adds.
    let service = ServiceExt::<Request<Incoming>>::map_request(
        router,
        move |mut request: Request<Incoming>| {
            request.extensions_mut().insert(ConnectInfo(peer));
            request
        },
    );

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(service));
    tokio::pin!(conn);

    let result = tokio::select! {
        res = conn.as_mut() => res,
        _ = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_is_visible_to_tokens() {
        let shutdown = Shutdown::new();
        let token = shutdown.token();
        assert!(!token.is_cancelled());

        shutdown.clone().trigger();
        assert!(token.is_cancelled());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_idle_server_stops_promptly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(serve_with_grace(
            listener,
            Router::new(),
            shutdown.clone(),
            Duration::from_secs(10),
        ));

        time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();

        let res = time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("server should stop well inside the grace period")
            .unwrap();
        assert!(res.is_ok());
    }
}
