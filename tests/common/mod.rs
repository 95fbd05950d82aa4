//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::IntoResponse,
    Json, Router,
};
use isolation_gate::config::GatewayConfig;
use isolation_gate::http::GatewayServer;
use isolation_gate::lifecycle::Shutdown;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A gateway running on an ephemeral port.
#[allow(dead_code)]
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<GatewayConfig>,
    pub task: JoinHandle<()>,
}

#[allow(dead_code)]
impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Bind first, then spawn, so requests queue instead of racing startup.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates, config_updates) = mpsc::unbounded_channel();

    let task = tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestGateway {
        addr,
        shutdown,
        updates,
        task,
    }
}

/// Start an upstream that echoes what it received as JSON and counts hits.
#[allow(dead_code)]
pub async fn start_echo_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().fallback(echo).with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, hits)
}

async fn echo(State(hits): State<Arc<AtomicUsize>>, request: Request<Body>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    let get = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let body = json!({
        "method": request.method().as_str(),
        "path_and_query": request.uri().path_and_query().map(|p| p.as_str()),
        "nonce": get("x-csp-nonce"),
        "request_id": get("x-request-id"),
        "connection": get("connection"),
    });

    ([(header::VARY, "accept-encoding")], Json(body))
}

/// Start an upstream that answers only after `delay`.
#[allow(dead_code)]
pub async fn start_slow_upstream(delay: Duration) -> SocketAddr {
    let app = Router::new().fallback(move || async move {
        tokio::time::sleep(delay).await;
        "late"
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start an upstream whose responses carry a fixed `Vary` value.
#[allow(dead_code)]
pub async fn start_fixed_vary_upstream(vary: &'static str) -> SocketAddr {
    let app = Router::new().fallback(move || async move { ([(header::VARY, vary)], "ok") });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Client that ignores proxy environment variables.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// All values of a response header.
#[allow(dead_code)]
pub fn header_values(response: &reqwest::Response, name: &str) -> Vec<String> {
    response
        .headers()
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
