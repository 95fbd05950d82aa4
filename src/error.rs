use thiserror::Error;

use crate::config::loader::ConfigError;

/// Top-level error for starting and running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address '{address}': {source}")]
    BindAddress {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("TLS error: {0}")]
    Tls(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
