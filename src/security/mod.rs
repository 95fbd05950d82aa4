//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → fetch_metadata.rs (reject cross-site non-navigational requests, 403)
//!     → csp.rs (generate nonce, stash in request extensions)
//!     → handler
//! Outgoing response:
//!     → coep.rs / coop.rs (isolation headers unless path is exempt)
//!     → csp.rs (policy header trusting the nonce)
//!     → fetch_metadata.rs (Vary on the Sec-Fetch-* headers)
//! ```
//!
//! # Design Decisions
//! - Policies are pure functions; middleware only wires them to axum
//! - Absent or unreadable Fetch Metadata headers take the permissive branch
//! - Filter state is an immutable snapshot; reload swaps the whole snapshot

pub mod coep;
pub mod coop;
pub mod csp;
pub mod exemptions;
pub mod fetch_metadata;
pub mod state;

pub use exemptions::ExemptedPaths;
pub use fetch_metadata::{Decision, DefaultResourceIsolationPolicy, FetchMetadata, ResourceIsolationPolicy};
pub use state::{SecurityState, SharedSecurity};
