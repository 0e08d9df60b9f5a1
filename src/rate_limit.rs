//! Request pacing with a minimum inter-request interval
//!
//! One shared [`RateLimiter`] per run spaces out every network-issuing call
//! site so the platform sees at most `max_per_second` requests. Acquisition
//! never fails; it only delays. Waiters are released in FIFO order.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between permit acquisitions.
///
/// Built on `tokio::time`, so tests can drive it under a paused clock.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between two `acquire` completions
    min_interval: Duration,
    /// Completion time of the most recent permit. The mutex is held across
    /// the wait, which is what gives FIFO ordering.
    last_permit: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_per_second` acquisitions per second.
    ///
    /// Non-positive or non-finite values disable pacing entirely.
    #[must_use]
    pub fn new(max_per_second: f64) -> Self {
        let min_interval = if max_per_second.is_finite() && max_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / max_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            last_permit: Mutex::new(None),
        }
    }

    /// The enforced spacing between consecutive permits
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Obtain a permit, suspending as long as needed so that no two
    /// completions are closer together than the minimum interval.
    pub async fn acquire(&self) {
        let mut last = self.last_permit.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }
}
