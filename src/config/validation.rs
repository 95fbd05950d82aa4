//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, report URIs, COOP mode and exempted paths
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::security::coep::{validate_report_uri, ReportUriError};
use crate::security::coop::{CoopMode, UnknownCoopMode};
use crate::security::exemptions::ExemptedPaths;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    Address { field: &'static str, value: String },

    #[error("upstream.address: '{0}' is not a host:port authority")]
    Upstream(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("coop.mode: {0}")]
    CoopMode(#[from] UnknownCoopMode),

    #[error("{field}: {source}")]
    ReportUri {
        field: &'static str,
        source: ReportUriError,
    },

    #[error("{field}: exempted path '{path}' must start with /")]
    ExemptedPath { field: &'static str, path: String },

    #[error("listener.tls: {0} must not be empty")]
    TlsPath(&'static str),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::TlsPath("cert_path"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::TlsPath("key_path"));
        }
    }

    if let Some(address) = &config.upstream.address {
        if Authority::from_str(address).is_err() {
            errors.push(ValidationError::Upstream(address.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    if let Err(e) = config.coop.mode.parse::<CoopMode>() {
        errors.push(e.into());
    }

    if let Err(source) = validate_report_uri(&config.coep.report_uri) {
        errors.push(ValidationError::ReportUri {
            field: "coep.report_uri",
            source,
        });
    }
    if let Some(uri) = &config.csp.report_uri {
        if let Err(source) = validate_report_uri(uri) {
            errors.push(ValidationError::ReportUri {
                field: "csp.report_uri",
                source,
            });
        }
    }

    check_paths("fetch_metadata.exempted_paths", &config.fetch_metadata.exempted_paths, &mut errors);
    check_paths("coop.exempted_paths", &config.coop.exempted_paths, &mut errors);
    check_paths("coep.exempted_paths", &config.coep.exempted_paths, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

fn check_paths(field: &'static str, paths: &ExemptedPaths, errors: &mut Vec<ValidationError>) {
    let mut bad: Vec<&str> = paths.iter().filter(|p| !p.starts_with('/')).collect();
    bad.sort_unstable();
    for path in bad {
        errors.push(ValidationError::ExemptedPath {
            field,
            path: path.to_string(),
        });
    }
}
