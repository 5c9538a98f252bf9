//! Linear backoff.

use std::time::Duration;

/// Delay before the attempt following failed attempt `attempt`: `attempt × base`.
pub fn linear_backoff(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(attempt)
}
