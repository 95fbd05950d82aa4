//! Cross-Origin-Embedder-Policy response header.
//!
//! Sends `require-corp` in enforcing or report-only form, with a `Report-To`
//! group pointing at the configured report URI.

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

pub const COEP_ENFORCING_HEADER: HeaderName = HeaderName::from_static("cross-origin-embedder-policy");
pub const COEP_REPORT_HEADER: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy-report-only");
pub const REPORT_TO_HEADER: HeaderName = HeaderName::from_static("report-to");

const REQUIRE_CORP: &str = "require-corp";
const REPORT_MAX_AGE_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportUriError {
    #[error("could not parse report URI '{0}'")]
    Unparseable(String),

    #[error("report URI '{0}' is not relative to the root, it must start with /")]
    NotRootRelative(String),
}

/// Accept absolute URIs and root-relative paths.
pub fn validate_report_uri(uri: &str) -> Result<(), ReportUriError> {
    if uri.is_empty() || uri.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ReportUriError::Unparseable(uri.to_string()));
    }

    match url::Url::parse(uri) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) if uri.starts_with('/') => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Err(ReportUriError::NotRootRelative(uri.to_string())),
        Err(_) => Err(ReportUriError::Unparseable(uri.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct CoepFilter {
    disabled: bool,
    header: HeaderName,
    value: HeaderValue,
    report_to: HeaderValue,
    exempted_paths: ExemptedPaths,
}

impl CoepFilter {
    pub fn new(
        enforcing: bool,
        disabled: bool,
        report_uri: &str,
        exempted_paths: ExemptedPaths,
    ) -> Result<Self, ReportUriError> {
        validate_report_uri(report_uri)?;

        let header = if enforcing {
            COEP_ENFORCING_HEADER
        } else {
            COEP_REPORT_HEADER
        };

        let value = format!("{REQUIRE_CORP}; report-to=\"{report_uri}\"");
        let report_to = serde_json::json!({
            "group": report_uri,
            "max_age": REPORT_MAX_AGE_SECS,
            "endpoints": [{ "url": report_uri }],
        })
        .to_string();

        let invalid = |_| ReportUriError::Unparseable(report_uri.to_string());
        Ok(Self {
            disabled,
            header,
            value: HeaderValue::from_str(&value).map_err(invalid)?,
            report_to: HeaderValue::from_str(&report_to).map_err(invalid)?,
            exempted_paths,
        })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header
    }

    pub fn apply(&self, path: &str, headers: &mut HeaderMap) {
        if self.disabled {
            return;
        }
        if self.exempted_paths.contains(path) {
            tracing::debug!(path = %path, "Skipping COEP header for exempted path");
            return;
        }
        headers.insert(self.header.clone(), self.value.clone());
        headers.insert(REPORT_TO_HEADER, self.report_to.clone());
    }
}

pub async fn coep_middleware(
    State(security): State<SharedSecurity>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let snapshot = security.load_full();
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    snapshot.coep.apply(&path, response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: &str = "require-corp; report-to=\"/coep-reports\"";

    #[test]
    fn disabled_filter_sets_nothing() {
        let filter = CoepFilter::new(true, true, "/coep-reports", ExemptedPaths::default()).unwrap();
        let mut headers = HeaderMap::new();
        filter.apply("/foo", &mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn enforcing_header() {
        let filter = CoepFilter::new(true, false, "/coep-reports", ExemptedPaths::default()).unwrap();
        let mut headers = HeaderMap::new();
        filter.apply("/foo", &mut headers);
        assert_eq!(headers.get(COEP_ENFORCING_HEADER).unwrap(), EXPECTED);
        assert!(headers.get(COEP_REPORT_HEADER).is_none());
    }

    #[test]
    fn reporting_header() {
        let filter = CoepFilter::new(false, false, "/coep-reports", ExemptedPaths::default()).unwrap();
        let mut headers = HeaderMap::new();
        filter.apply("/foo", &mut headers);
        assert_eq!(headers.get(COEP_REPORT_HEADER).unwrap(), EXPECTED);
        assert!(headers.get(COEP_ENFORCING_HEADER).is_none());
    }

    #[test]
    fn report_to_group_points_at_report_uri() {
        let filter = CoepFilter::new(true, false, "/coep-reports", ExemptedPaths::default()).unwrap();
        let mut headers = HeaderMap::new();
        filter.apply("/foo", &mut headers);

        let raw = headers.get(REPORT_TO_HEADER).unwrap().to_str().unwrap();
        let group: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(group["group"], "/coep-reports");
        assert_eq!(group["max_age"], 86_400);
        assert_eq!(group["endpoints"][0]["url"], "/coep-reports");
    }

    #[test]
    fn exempted_path_gets_no_header() {
        let filter =
            CoepFilter::new(true, false, "/coep-reports", ExemptedPaths::parse_delimited("/foo")).unwrap();
        let mut headers = HeaderMap::new();
        filter.apply("/foo", &mut headers);
        assert!(headers.get(COEP_ENFORCING_HEADER).is_none());
    }

    #[test]
    fn report_uri_validation() {
        assert!(validate_report_uri("/coep-reports").is_ok());
        assert!(validate_report_uri("https://reports.example.com/coep").is_ok());
        assert_eq!(
            validate_report_uri("ww w. google.@com"),
            Err(ReportUriError::Unparseable("ww w. google.@com".to_string()))
        );
        assert_eq!(
            validate_report_uri("some-uri"),
            Err(ReportUriError::NotRootRelative("some-uri".to_string()))
        );
        assert!(validate_report_uri("").is_err());
    }
}
