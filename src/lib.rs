//! Browser isolation gateway library.
//!
//! Axum middleware that rejects cross-site requests using Fetch Metadata,
//! adds COOP/COEP headers, and issues a per-request CSP nonce for inline
//! `<style>` elements.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;
pub mod views;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
