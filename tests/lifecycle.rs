//! End-to-end tests over real sockets: serving, graceful drain and fatal
//! startup/shutdown conditions.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use health_shim::config::HealthShimConfig;
use health_shim::health::StatsFetcher;
use health_shim::lifecycle::{self, LifecycleError, Shutdown};
use health_shim::net::ListenerError;

mod common;

use common::{FailingFetcher, StaticFetcher};

struct Running {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), LifecycleError>>,
}

async fn start(fetcher: impl StatsFetcher + 'static, config: HealthShimConfig) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();

    let front_door = common::front_door(fetcher, &config, shutdown.clone());
    let handle = tokio::spawn(front_door.run(listener));

    Running {
        addr,
        shutdown,
        handle,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_serves_probes_and_proxy_over_tcp() {
    let diag = common::start_diag_stub(Duration::ZERO).await;
    let server = start(StaticFetcher(200), common::config_for(diag)).await;
    let client = client();

    let res = client
        .get(format!("http://{}/ambassador/v0/check_alive", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Ambassador is alive and well\n");

    let res = client
        .get(format!("http://{}/ambassador/v0/diag/?json=true", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-seen-path"], "/ambassador/v0/diag/?json=true");
    // Real loopback connection, so the stub sees the marker.
    assert_eq!(res.headers()["x-seen-marker"], "127.0.0.1");

    server.shutdown.cancel();
    assert!(server.handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_failing_stats_yields_503_over_tcp() {
    let diag = common::start_diag_stub(Duration::ZERO).await;
    let server = start(FailingFetcher, common::config_for(diag)).await;

    let res = client()
        .get(format!("http://{}/ambassador/v0/check_ready", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);

    server.shutdown.cancel();
    assert!(server.handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_in_flight_request_finishes_during_shutdown() {
    let diag = common::start_diag_stub(Duration::from_millis(500)).await;
    let server = start(StaticFetcher(200), common::config_for(diag)).await;

    let url = format!("http://{}/slow", server.addr);
    let request = tokio::spawn(async move { client().get(url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown.cancel();

    let res = request.await.unwrap().expect("in-flight request completes");
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-seen-path"], "/slow");

    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server stops after draining")
        .unwrap();
    assert!(result.is_ok());

    // No longer listening.
    assert!(TcpStream::connect(server.addr).await.is_err());
}

#[tokio::test]
async fn test_shutdown_bound_is_enforced() {
    // The origin would answer 2s after the grace period ends.
    let diag = common::start_diag_stub(Duration::from_secs(3)).await;
    let mut config = common::config_for(diag);
    config.shutdown.grace_period_secs = 1;
    let server = start(StaticFetcher(200), config).await;

    let url = format!("http://{}/stuck", server.addr);
    let request = tokio::spawn(async move { client().get(url).send().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    server.shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("shutdown must not hang past its bound")
        .unwrap();

    assert!(matches!(result, Err(LifecycleError::ShutdownTimeout(d)) if d == Duration::from_secs(1)));
    assert!(started.elapsed() >= Duration::from_secs(1));

    // The stuck connection is closed, not left to finish late.
    let outcome = tokio::time::timeout(Duration::from_millis(1500), request)
        .await
        .expect("client is cut off when the bound expires")
        .unwrap();
    assert!(
        outcome.is_err(),
        "expected a closed connection, got {:?}",
        outcome.map(|r| r.status())
    );
}

#[tokio::test]
async fn test_port_in_use_is_fatal() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let mut config = HealthShimConfig::default();
    config.listener.bind_address = occupied.local_addr().unwrap().to_string();

    let result = lifecycle::run(config, Shutdown::new()).await;
    assert!(matches!(
        result,
        Err(LifecycleError::Bind(ListenerError::Bind { .. }))
    ));
}

#[tokio::test]
async fn test_run_stops_on_trigger() {
    let mut config = HealthShimConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(lifecycle::run(config, shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run returns after trigger")
        .unwrap();
    assert!(result.is_ok());
}
