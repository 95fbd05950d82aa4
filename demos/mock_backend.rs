//! Pretend upstream application for trying the gateway locally.
//!
//! ```text
//! cargo run --example mock_backend
//! printf '[upstream]\naddress = "127.0.0.1:8081"\n' > gate.toml
//! cargo run -- --config gate.toml
//! curl -i -H 'sec-fetch-site: cross-site' -H 'sec-fetch-mode: cors' localhost:8080/
//! ```
//!
//! Pages use the nonce the gateway forwards in `x-csp-nonce`, so their inline
//! style survives the gateway's Content-Security-Policy.

use std::net::SocketAddr;

use axum::{http::HeaderMap, response::Html, routing::get, Router};
use isolation_gate::views::StyleTag;

async fn index(headers: HeaderMap) -> Html<String> {
    let nonce = headers.get("x-csp-nonce").and_then(|v| v.to_str().ok());
    let style = StyleTag::new()
        .media("screen")
        .body("h1 { color: rebeccapurple; }")
        .render(nonce);

    Html(format!(
        "<!DOCTYPE html><html><head>{style}</head><body><h1>Hello from the pretend website!</h1></body></html>"
    ))
}

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/", get(index))
        .route("/status", get(|| async { "Backend is healthy!" }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Pretend website is listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
