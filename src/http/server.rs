//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with health route and gateway fallback
//! - Wire up middleware (tracing, request ID, timeout, body limit)
//! - Wire up the security filters in order
//! - Swap in new filter snapshots when the config file changes
//! - Serve plain TCP or TLS with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    Extension,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig};
use crate::http::forward::Upstream;
use crate::http::pages;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::lifecycle::ShutdownSignal;
use crate::security::coep::coep_middleware;
use crate::security::coop::coop_middleware;
use crate::security::csp::{csp_middleware, CspNonce};
use crate::security::fetch_metadata::fetch_metadata_middleware;
use crate::security::{SecurityState, SharedSecurity};

const TLS_DRAIN_SECS: u64 = 10;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Option<Upstream>,
}

/// HTTP server for the isolation gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    security: SharedSecurity,
}

impl GatewayServer {
    /// Create a new server. Fails if the security or upstream settings are
    /// invalid.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let security = SecurityState::from_config(&config)?.shared();
        let upstream = config
            .upstream
            .address
            .as_deref()
            .map(Upstream::new)
            .transpose()?;

        let router = Self::build_router(&config, security.clone(), AppState { upstream });
        Ok(Self {
            router,
            config,
            security,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later run first: tracing and request id wrap
    /// everything. Fetch Metadata sits outside the timeout so a timed-out
    /// request still gets `Vary`, and runs before the nonce and header
    /// filters.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, security: SharedSecurity, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(pages::health))
            .fallback(gateway_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(security.clone(), coep_middleware))
            .layer(middleware::from_fn_with_state(security.clone(), coop_middleware))
            .layer(middleware::from_fn_with_state(security.clone(), csp_middleware))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(security, fetch_metadata_middleware))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The fully layered router, for in-process use and tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live filter snapshot.
    pub fn security(&self) -> SharedSecurity {
        self.security.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server on a bound listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        spawn_reload_loop(self.security.clone(), self.config.clone(), config_updates);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        spawn_reload_loop(self.security.clone(), self.config.clone(), config_updates);

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            wait_for(shutdown).await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Apply config file changes to the security filters.
fn spawn_reload_loop(
    security: SharedSecurity,
    current: GatewayConfig,
    mut updates: mpsc::UnboundedReceiver<GatewayConfig>,
) {
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            if config.listener.bind_address != current.listener.bind_address
                || config.upstream.address != current.upstream.address
            {
                tracing::warn!("Listener and upstream changes take effect after restart");
            }
            match SecurityState::from_config(&config) {
                Ok(state) => {
                    security.store(Arc::new(state));
                    tracing::info!("Security filters reloaded");
                }
                Err(e) => tracing::error!(error = %e, "Rejected reloaded config"),
            }
        }
    });
}

async fn wait_for(mut shutdown: ShutdownSignal) {
    shutdown.recv().await;
    tracing::info!("Shutdown signal received");
}

/// Forward upstream when one is configured, otherwise serve the demo page.
async fn gateway_handler(
    State(state): State<AppState>,
    nonce: Option<Extension<CspNonce>>,
    request: Request<Body>,
) -> Response {
    match &state.upstream {
        Some(upstream) => upstream.forward(request).await,
        None => {
            let nonce = nonce.as_ref().map(|Extension(n)| n);
            pages::demo_page(nonce, request.uri().path()).into_response()
        }
    }
}
