//! Metrics collection and exposition.
//!
//! # Metrics
//! - `roproxy_requests_total` (counter): requests by method, status, outcome
//! - `roproxy_request_duration_seconds` (histogram): end-to-end latency
//! - `roproxy_upstream_failures_total` (counter): failed upstream attempts
//!
//! Without [`init_metrics`] the macros record into the no-op recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "roproxy_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "roproxy_request_duration_seconds";
pub const UPSTREAM_FAILURES_TOTAL: &str = "roproxy_upstream_failures_total";

/// How a request left the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream response relayed.
    Relayed,
    /// Admission gate rejected the request.
    Rejected,
    /// Request-target could not be translated.
    Malformed,
    /// Inbound body exceeded the buffering limit.
    TooLarge,
    /// Every attempt failed at the transport level.
    Exhausted,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Relayed => "relayed",
            Outcome::Rejected => "rejected",
            Outcome::Malformed => "malformed",
            Outcome::TooLarge => "too_large",
            Outcome::Exhausted => "exhausted",
        }
    }
}

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "Total number of requests answered by the proxy."
    );
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of requests answered by the proxy, retries included."
    );
    describe_counter!(
        UPSTREAM_FAILURES_TOTAL,
        Unit::Count,
        "Upstream attempts that failed at the transport level."
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count a request answered by the proxy.
pub fn record_request(method: &str, status: u16, outcome: Outcome) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record end-to-end latency of a forwarded request.
pub fn record_duration(start: Instant) {
    histogram!(REQUEST_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
}

/// Count one failed upstream attempt.
pub fn record_upstream_failure() {
    counter!(UPSTREAM_FAILURES_TOTAL).increment(1);
}
