//! Forwarding allowed requests to the upstream server.

use std::str::FromStr;

use axum::{
    body::Body,
    http::{
        header,
        uri::{Authority, Scheme},
        HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::validation::ValidationError;
use crate::config::ConfigError;
use crate::http::request::request_id;
use crate::security::csp::CspNonce;

/// Request header carrying the CSP nonce so upstream pages can use it.
pub const X_CSP_NONCE: HeaderName = HeaderName::from_static("x-csp-nonce");

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// HTTP/1.1 client bound to a single upstream authority.
#[derive(Clone)]
pub struct Upstream {
    authority: Authority,
    client: Client<HttpConnector, Body>,
}

impl Upstream {
    pub fn new(address: &str) -> Result<Self, ConfigError> {
        let authority = Authority::from_str(address)
            .map_err(|_| ConfigError::Validation(vec![ValidationError::Upstream(address.to_string())]))?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { authority, client })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub async fn forward(&self, request: Request<Body>) -> Response {
        let request_id = request_id(&request).to_string();
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        let uri = match Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
        {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Could not build upstream URI");
                return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
            }
        };

        parts.uri = uri;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        if let Some(nonce) = parts.extensions.get::<CspNonce>() {
            if let Ok(value) = HeaderValue::from_str(nonce.as_str()) {
                parts.headers.insert(X_CSP_NONCE, value);
            }
        }

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            "Forwarding request"
        );

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}
