//! Network layer subsystem.
//!
//! Plain TCP listeners come straight from Tokio; this module only covers
//! TLS, which is optional and handled by axum-server with rustls.

pub mod tls;
