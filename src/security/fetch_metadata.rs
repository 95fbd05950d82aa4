//! Fetch Metadata resource isolation.
//!
//! Browsers attach `Sec-Fetch-Site`, `Sec-Fetch-Mode` and `Sec-Fetch-Dest`
//! to every request. The policy here uses them to reject cross-site requests
//! that are not top-level navigations, which cuts off most CSRF, XSSI and
//! cross-site leak vectors without touching same-origin traffic.
//!
//! # Rules (first match wins)
//! 1. No `Sec-Fetch-Site` header: allow (browser predates Fetch Metadata).
//! 2. Site is `same-origin`, `same-site` or `none`: allow.
//! 3. `GET` navigation whose destination is not `object`/`embed`: allow.
//! 4. Anything else: reject with 403.
//!
//! Exempted paths are checked before the policy runs. Every response that
//! passes through the filter, allowed or not, gets a `Vary` listing the three
//! headers so caches key on them.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::security::exemptions::ExemptedPaths;
use crate::security::state::SharedSecurity;

pub const SEC_FETCH_SITE_HEADER: &str = "sec-fetch-site";
pub const SEC_FETCH_MODE_HEADER: &str = "sec-fetch-mode";
pub const SEC_FETCH_DEST_HEADER: &str = "sec-fetch-dest";

/// Value of the `Vary` header added to every filtered response.
pub const VARY_HEADER_VALUE: &str = "sec-fetch-dest, sec-fetch-site, sec-fetch-mode";

const TRUSTED_SITES: [&str; 3] = ["same-origin", "same-site", "none"];
const DISALLOWED_NAVIGATION_DESTS: [&str; 2] = ["object", "embed"];

/// Outcome of evaluating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Reject,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the request fields the policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchMetadata<'a> {
    pub site: Option<&'a str>,
    pub mode: Option<&'a str>,
    pub dest: Option<&'a str>,
    pub method: &'a str,
}

impl<'a> FetchMetadata<'a> {
    /// Project headers and method. Values that are not visible ASCII read as
    /// absent.
    pub fn from_parts(headers: &'a HeaderMap, method: &'a Method) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            site: get(SEC_FETCH_SITE_HEADER),
            mode: get(SEC_FETCH_MODE_HEADER),
            dest: get(SEC_FETCH_DEST_HEADER),
            method: method.as_str(),
        }
    }

    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self::from_parts(req.headers(), req.method())
    }
}

/// Decides whether a request may reach the application.
pub trait ResourceIsolationPolicy: Send + Sync + fmt::Debug {
    fn evaluate(&self, request: &FetchMetadata<'_>) -> Decision;
}

/// The standard Fetch Metadata policy described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResourceIsolationPolicy;

impl ResourceIsolationPolicy for DefaultResourceIsolationPolicy {
    fn evaluate(&self, request: &FetchMetadata<'_>) -> Decision {
        evaluate(request.site, request.mode, request.dest, request.method)
    }
}

/// Evaluate the default policy on raw header values.
pub fn evaluate(site: Option<&str>, mode: Option<&str>, dest: Option<&str>, method: &str) -> Decision {
    let Some(site) = site else {
        return Decision::Allow;
    };

    if TRUSTED_SITES.contains(&site) {
        return Decision::Allow;
    }

    let top_level_navigation = mode == Some("navigate")
        && method == Method::GET.as_str()
        && !dest.is_some_and(|d| DISALLOWED_NAVIGATION_DESTS.contains(&d));
    if top_level_navigation {
        return Decision::Allow;
    }

    Decision::Reject
}

/// A policy plus the paths it never applies to.
#[derive(Debug, Clone)]
pub struct FetchMetadataFilter {
    policy: Arc<dyn ResourceIsolationPolicy>,
    exempted_paths: ExemptedPaths,
}

impl FetchMetadataFilter {
    pub fn new(exempted_paths: ExemptedPaths) -> Self {
        Self::with_policy(Arc::new(DefaultResourceIsolationPolicy), exempted_paths)
    }

    pub fn with_policy(policy: Arc<dyn ResourceIsolationPolicy>, exempted_paths: ExemptedPaths) -> Self {
        Self {
            policy,
            exempted_paths,
        }
    }

    pub fn exempted_paths(&self) -> &ExemptedPaths {
        &self.exempted_paths
    }

    /// Exemption check first, then the policy.
    pub fn admit(&self, path: &str, request: &FetchMetadata<'_>) -> Decision {
        if self.exempted_paths.contains(path) {
            return Decision::Allow;
        }
        self.policy.evaluate(request)
    }
}

/// Append the Fetch Metadata `Vary` value unless it is already there.
/// Header names in `Vary` are case-insensitive.
pub fn add_vary(headers: &mut HeaderMap) {
    let present = headers
        .get_all(header::VARY)
        .iter()
        .any(|v| v.as_bytes().eq_ignore_ascii_case(VARY_HEADER_VALUE.as_bytes()));
    if !present {
        headers.append(header::VARY, HeaderValue::from_static(VARY_HEADER_VALUE));
    }
}

/// Middleware enforcing the Fetch Metadata policy.
pub async fn fetch_metadata_middleware(
    State(security): State<SharedSecurity>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let snapshot = security.load_full();
    let Some(filter) = snapshot.fetch_metadata.as_ref() else {
        return next.run(request).await;
    };

    let path = request.uri().path();
    let metadata = FetchMetadata::from_request(&request);
    let decision = filter.admit(path, &metadata);
    metrics::record_decision(decision);

    let mut response = match decision {
        Decision::Allow => next.run(request).await,
        Decision::Reject => {
            tracing::warn!(
                path = %path,
                method = %metadata.method,
                site = ?metadata.site,
                mode = ?metadata.mode,
                dest = ?metadata.dest,
                "Rejected cross-site request"
            );
            (StatusCode::FORBIDDEN, "Cross-site request rejected").into_response()
        }
    };

    add_vary(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta<'a>(
        site: Option<&'a str>,
        mode: Option<&'a str>,
        dest: Option<&'a str>,
        method: &'a str,
    ) -> FetchMetadata<'a> {
        FetchMetadata {
            site,
            mode,
            dest,
            method,
        }
    }

    #[test]
    fn missing_site_is_allowed() {
        let policy = DefaultResourceIsolationPolicy;
        for method in ["GET", "POST", "DELETE"] {
            let req = meta(None, Some("cors"), Some("empty"), method);
            assert_eq!(policy.evaluate(&req), Decision::Allow);
        }
    }

    #[test]
    fn trusted_sites_are_allowed_regardless_of_other_headers() {
        for site in ["same-origin", "same-site", "none"] {
            assert_eq!(evaluate(Some(site), Some("no-cors"), Some("object"), "POST"), Decision::Allow);
            assert_eq!(evaluate(Some(site), None, None, "PUT"), Decision::Allow);
        }
    }

    #[test]
    fn top_level_navigation_is_allowed() {
        assert_eq!(
            evaluate(Some("cross-site"), Some("navigate"), Some("script"), "GET"),
            Decision::Allow
        );
        assert_eq!(
            evaluate(Some("cross-site"), Some("navigate"), Some("document"), "GET"),
            Decision::Allow
        );
        assert_eq!(evaluate(Some("cross-site"), Some("navigate"), None, "GET"), Decision::Allow);
    }

    #[test]
    fn navigation_into_object_or_embed_is_rejected() {
        for dest in ["object", "embed"] {
            assert_eq!(
                evaluate(Some("foo"), Some("navigate"), Some(dest), "GET"),
                Decision::Reject
            );
        }
    }

    #[test]
    fn non_get_navigation_is_rejected() {
        assert_eq!(
            evaluate(Some("cross-site"), Some("navigate"), Some("document"), "POST"),
            Decision::Reject
        );
    }

    #[test]
    fn cross_site_subresource_is_rejected() {
        assert_eq!(
            evaluate(Some("cross-site"), Some("no-cors"), Some("image"), "GET"),
            Decision::Reject
        );
        assert_eq!(evaluate(Some("cross-site"), None, None, "GET"), Decision::Reject);
    }

    #[test]
    fn header_matching_is_case_sensitive() {
        assert_eq!(evaluate(Some("Same-Origin"), None, None, "GET"), Decision::Reject);
        assert_eq!(
            evaluate(Some("cross-site"), Some("navigate"), Some("document"), "get"),
            Decision::Reject
        );
    }

    #[test]
    fn exempted_path_bypasses_policy() {
        let filter = FetchMetadataFilter::new(ExemptedPaths::parse_delimited("/foo,/bar"));
        let req = meta(Some("foo"), None, None, "GET");
        assert_eq!(filter.admit("/foo", &req), Decision::Allow);
        assert_eq!(filter.admit("/foobar", &req), Decision::Reject);
    }

    #[test]
    fn custom_policy_is_consulted() {
        #[derive(Debug)]
        struct DenyAll;
        impl ResourceIsolationPolicy for DenyAll {
            fn evaluate(&self, _request: &FetchMetadata<'_>) -> Decision {
                Decision::Reject
            }
        }

        let filter = FetchMetadataFilter::with_policy(Arc::new(DenyAll), ExemptedPaths::default());
        assert_eq!(filter.admit("/", &meta(None, None, None, "GET")), Decision::Reject);
    }

    #[test]
    fn projection_treats_opaque_values_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(SEC_FETCH_SITE_HEADER, HeaderValue::from_bytes(b"cross\xffsite").unwrap());
        headers.insert(SEC_FETCH_MODE_HEADER, HeaderValue::from_static("navigate"));
        let method = Method::POST;

        let view = FetchMetadata::from_parts(&headers, &method);
        assert_eq!(view.site, None);
        assert_eq!(view.mode, Some("navigate"));
        assert_eq!(view.dest, None);
        assert_eq!(view.method, "POST");
    }

    #[test]
    fn vary_is_added_once() {
        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("accept-encoding"));

        add_vary(&mut headers);
        add_vary(&mut headers);

        let values: Vec<_> = headers.get_all(header::VARY).iter().collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], "accept-encoding");
        assert_eq!(values[1], VARY_HEADER_VALUE);
    }

    #[test]
    fn vary_match_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::VARY,
            HeaderValue::from_static("Sec-Fetch-Dest, Sec-Fetch-Site, Sec-Fetch-Mode"),
        );

        add_vary(&mut headers);

        assert_eq!(headers.get_all(header::VARY).iter().count(), 1);
    }
}
