//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::security::exemptions::ExemptedPaths;

/// Root configuration for the isolation gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Upstream server that allowed requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Fetch Metadata resource isolation filter.
    pub fetch_metadata: FetchMetadataConfig,

    /// Cross-Origin-Opener-Policy filter.
    pub coop: CoopConfig,

    /// Cross-Origin-Embedder-Policy filter.
    pub coep: CoepConfig,

    /// Content-Security-Policy nonce filter.
    pub csp: CspConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream configuration.
///
/// With no address set, the gateway serves its built-in page instead of
/// forwarding.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Fetch Metadata filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchMetadataConfig {
    /// Enable the filter.
    pub enabled: bool,

    /// Paths meant to be served cross-origin. Requests to these paths skip
    /// the policy entirely.
    pub exempted_paths: ExemptedPaths,
}

impl Default for FetchMetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exempted_paths: ExemptedPaths::default(),
        }
    }
}

/// Cross-Origin-Opener-Policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoopConfig {
    /// Enable the header.
    pub enabled: bool,

    /// One of "same-origin", "same-origin-allow-popups", "unsafe-none".
    pub mode: String,

    /// Paths that never receive the header.
    pub exempted_paths: ExemptedPaths,
}

impl Default for CoopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: "same-origin".to_string(),
            exempted_paths: ExemptedPaths::default(),
        }
    }
}

/// Cross-Origin-Embedder-Policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoepConfig {
    /// Turn the header off entirely.
    pub disabled: bool,

    /// `true` sends the enforcing header, `false` the report-only one.
    pub enforcing_mode: bool,

    /// Where violation reports go. Absolute, or relative to the root.
    pub report_uri: String,

    /// Paths that never receive the header.
    pub exempted_paths: ExemptedPaths,
}

impl Default for CoepConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            enforcing_mode: true,
            report_uri: "/coep-reports".to_string(),
            exempted_paths: ExemptedPaths::default(),
        }
    }
}

/// Content-Security-Policy nonce configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CspConfig {
    /// Generate a nonce per request and send the policy header.
    pub enabled: bool,

    /// Send `Content-Security-Policy-Report-Only` instead.
    pub report_only: bool,

    /// Optional `report-uri` directive.
    pub report_uri: Option<String>,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            report_only: false,
            report_uri: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" for development, "json" for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.fetch_metadata.enabled);
        assert!(config.fetch_metadata.exempted_paths.is_empty());
        assert_eq!(config.coop.mode, "same-origin");
        assert!(config.coep.enforcing_mode);
        assert_eq!(config.coep.report_uri, "/coep-reports");
        assert!(config.upstream.address.is_none());
    }

    #[test]
    fn exempted_paths_accept_list_or_comma_string() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [fetch_metadata]
            exempted_paths = ["/foo", "/bar"]

            [coop]
            mode = "unsafe-none"
            exempted_paths = "/foo, /bar ,"
            "#,
        )
        .unwrap();

        assert!(config.fetch_metadata.exempted_paths.contains("/foo"));
        assert!(config.fetch_metadata.exempted_paths.contains("/bar"));
        assert_eq!(config.coop.exempted_paths.len(), 2);
        assert!(config.coop.exempted_paths.contains("/bar"));
    }

    #[test]
    fn log_format_parses_lowercase() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
