//! Per-request Content-Security-Policy nonce.
//!
//! The middleware generates a fresh nonce, stores it in the request
//! extensions for handlers (the `<style>` tag reads it from there) and sets a
//! policy header that trusts only elements carrying it.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;

use crate::security::state::SharedSecurity;

pub const CSP_HEADER: HeaderName = HeaderName::from_static("content-security-policy");
pub const CSP_REPORT_HEADER: HeaderName = HeaderName::from_static("content-security-policy-report-only");

const NONCE_BYTES: usize = 18;

/// Nonce attached to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspNonce(String);

impl CspNonce {
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct CspFilter {
    report_only: bool,
    report_uri: Option<String>,
}

impl CspFilter {
    pub fn new(report_only: bool, report_uri: Option<String>) -> Self {
        Self {
            report_only,
            report_uri,
        }
    }

    pub fn header_name(&self) -> HeaderName {
        if self.report_only {
            CSP_REPORT_HEADER
        } else {
            CSP_HEADER
        }
    }

    pub fn policy(&self, nonce: &CspNonce) -> String {
        let n = nonce.as_str();
        let mut policy = format!(
            "object-src 'none'; script-src 'nonce-{n}' 'strict-dynamic' http: https:; \
             style-src 'self' 'nonce-{n}'; base-uri 'none'"
        );
        if let Some(uri) = &self.report_uri {
            policy.push_str("; report-uri ");
            policy.push_str(uri);
        }
        policy
    }
}

pub async fn csp_middleware(
    State(security): State<SharedSecurity>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let snapshot = security.load_full();
    let Some(filter) = snapshot.csp.as_ref() else {
        return next.run(request).await;
    };

    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce.clone());

    let mut response = next.run(request).await;
    let name = filter.header_name();
    if !response.headers().contains_key(&name) {
        match HeaderValue::from_str(&filter.policy(&nonce)) {
            Ok(value) => {
                response.headers_mut().insert(name, value);
            }
            Err(e) => tracing::error!(error = %e, "Invalid CSP header value"),
        }
    }
    response
}
