//! Pages served by the gateway itself.

use axum::response::Html;

use crate::security::csp::CspNonce;
use crate::views::StyleTag;

const DEMO_CSS: &str = "body { font-family: system-ui, sans-serif; margin: 2rem; color: #222; }";

pub async fn health() -> &'static str {
    "ok"
}

/// Built-in page, served when no upstream is configured. Its inline style
/// only applies when the nonce matches the CSP header.
pub fn demo_page(nonce: Option<&CspNonce>, path: &str) -> Html<String> {
    let style = StyleTag::new()
        .type_("text/css")
        .body(DEMO_CSS)
        .render(nonce.map(CspNonce::as_str));

    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>isolation-gate</title>\n{style}\n</head>\n\
         <body>\n<h1>isolation-gate</h1>\n<p>Requested path: <code>{path}</code></p>\n</body>\n</html>\n",
        path = crate::views::style::escape_attribute(path),
    ))
}
