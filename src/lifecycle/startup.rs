//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Start the config watcher and signal listener
//! - Bind the listener (plain or TLS) and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, GatewayConfig};
use crate::error::{GatewayError, Result};
use crate::http::GatewayServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::net::tls::load_tls_config;
use crate::observability::{logging, metrics};

/// Load `config_path` (or defaults) and serve until a shutdown signal.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "isolation-gate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        upstream = ?config.upstream.address,
        fetch_metadata = config.fetch_metadata.enabled,
        exempted_paths = config.fetch_metadata.exempted_paths.len(),
        coop_mode = %config.coop.mode,
        coep_enforcing = config.coep.enforcing_mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = parse_addr(&config.observability.metrics_address)?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_listener(shutdown.clone());

    // The watcher stops when dropped, so it lives until run returns.
    let (config_updates, _watcher) = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(w) => (updates, Some(w)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    (updates, None)
                }
            }
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let server = GatewayServer::new(config.clone())?;
    match &config.listener.tls {
        Some(tls) => {
            let rustls = load_tls_config(tls).await?;
            let addr = parse_addr(&config.listener.bind_address)?;
            server
                .run_tls(addr, rustls, config_updates, shutdown.subscribe())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            server
                .run(listener, config_updates, shutdown.subscribe())
                .await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn parse_addr(address: &str) -> Result<SocketAddr> {
    address.parse().map_err(|source| GatewayError::BindAddress {
        address: address.to_string(),
        source,
    })
}
