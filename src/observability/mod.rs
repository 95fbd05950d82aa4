//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware and handlers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (decision counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
