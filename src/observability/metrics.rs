//! Metrics collection and exposition.
//!
//! # Metrics
//! - `isolation_requests_total` (counter): Fetch Metadata decisions by `decision`
//! - `isolation_requests_rejected_total` (counter): requests answered with 403
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::security::fetch_metadata::Decision;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(
        "isolation_requests_total",
        "Fetch Metadata decisions, labelled allow or reject"
    );
    describe_counter!(
        "isolation_requests_rejected_total",
        "Requests rejected by the resource isolation policy"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_decision(decision: Decision) {
    counter!("isolation_requests_total", "decision" => decision.as_str()).increment(1);
    if decision == Decision::Reject {
        counter!("isolation_requests_rejected_total").increment(1);
    }
}
