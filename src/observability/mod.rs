//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → logging.rs (structured tracing events: attempt, target, status)
//!     → metrics.rs (request counters, latency, upstream failures)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every transport failure is logged with its attempt number
//! - Metrics are no-ops unless the exporter is installed

pub mod logging;
pub mod metrics;
