//! Cross-Origin-Opener-Policy response header.

use std::fmt;
use std::str::FromStr;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::security::exemptions::ExemptedPaths;
use crate::security::state::SharedSecurity;

pub const COOP_HEADER: HeaderName = HeaderName::from_static("cross-origin-opener-policy");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoopMode {
    #[default]
    SameOrigin,
    SameOriginAllowPopups,
    UnsafeNone,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Mode '{0}' not recognized")]
pub struct UnknownCoopMode(pub String);

impl CoopMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CoopMode::SameOrigin => "same-origin",
            CoopMode::SameOriginAllowPopups => "same-origin-allow-popups",
            CoopMode::UnsafeNone => "unsafe-none",
        }
    }
}

impl FromStr for CoopMode {
    type Err = UnknownCoopMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "same-origin" => Ok(CoopMode::SameOrigin),
            "same-origin-allow-popups" => Ok(CoopMode::SameOriginAllowPopups),
            "unsafe-none" => Ok(CoopMode::UnsafeNone),
            other => Err(UnknownCoopMode(other.to_string())),
        }
    }
}

impl fmt::Display for CoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CoopFilter {
    mode: CoopMode,
    exempted_paths: ExemptedPaths,
}

impl CoopFilter {
    pub fn new(mode: CoopMode, exempted_paths: ExemptedPaths) -> Self {
        Self {
            mode,
            exempted_paths,
        }
    }

    pub fn mode(&self) -> CoopMode {
        self.mode
    }

    pub fn is_exempted(&self, path: &str) -> bool {
        self.exempted_paths.contains(path)
    }

    pub fn apply(&self, path: &str, headers: &mut HeaderMap) {
        if self.is_exempted(path) {
            tracing::debug!(path = %path, "Skipping COOP header for exempted path");
            return;
        }
        headers.insert(COOP_HEADER, HeaderValue::from_static(self.mode.as_str()));
    }
}

pub async fn coop_middleware(
    State(security): State<SharedSecurity>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let snapshot = security.load_full();
    let Some(filter) = snapshot.coop.as_ref() else {
        return next.run(request).await;
    };

    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    filter.apply(&path, response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_round_trip_through_strings() {
        for mode in [CoopMode::SameOrigin, CoopMode::SameOriginAllowPopups, CoopMode::UnsafeNone] {
            assert_eq!(mode.as_str().parse::<CoopMode>(), Ok(mode));
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "cross-origin".parse::<CoopMode>().unwrap_err();
        assert_eq!(err.to_string(), "Mode 'cross-origin' not recognized");
    }

    #[test]
    fn header_is_set_with_configured_mode() {
        let filter = CoopFilter::new(CoopMode::SameOriginAllowPopups, ExemptedPaths::default());
        let mut headers = HeaderMap::new();
        filter.apply("/app", &mut headers);
        assert_eq!(headers.get(COOP_HEADER).unwrap(), "same-origin-allow-popups");
    }

    #[test]
    fn exempted_path_gets_no_header() {
        let filter = CoopFilter::new(CoopMode::SameOrigin, ExemptedPaths::parse_delimited("/popup"));
        let mut headers = HeaderMap::new();
        filter.apply("/popup", &mut headers);
        assert!(headers.get(COOP_HEADER).is_none());
    }
}
