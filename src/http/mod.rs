//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → security filters (see crate::security)
//!     → forward.rs (upstream) or pages.rs (built-in page)
//!     → Send to client
//! ```

pub mod forward;
pub mod pages;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::GatewayServer;
