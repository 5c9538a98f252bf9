//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → retries.rs (Attempting(n) → Succeeded | Attempting(n+1) | Exhausted)
//!     → backoff.rs (n × base delay between attempts)
//! ```
//!
//! # Design Decisions
//! - Only transport failures are retried; any HTTP status is a success here
//! - The loop is iterative and bounded by the attempt counter
//! - The state machine knows nothing about HTTP, so it is tested alone

pub mod backoff;
pub mod retries;

pub use backoff::linear_backoff;
pub use retries::{RetryOutcome, RetryPolicy};
