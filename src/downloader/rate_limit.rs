//! Request pacing shared across all workers
//!
//! The provider limits requests per security token, so one limiter instance
//! is shared by every concurrent work unit. Slot assignment is serialized
//! behind a single async mutex; the wait itself happens outside the lock, so
//! callers queue for a timestamp, not for each other's sleeps.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum delay between consecutive request starts.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum inter-request delay.
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Create a shared limiter wrapped in [`Arc`].
    pub fn shared(min_delay: Duration) -> Arc<Self> {
        Arc::new(Self::new(min_delay))
    }

    /// The configured minimum inter-request delay.
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Wait for the next request slot.
    ///
    /// Returns the time actually waited. Concurrent callers are assigned
    /// strictly increasing slots `min_delay` apart.
    pub async fn acquire(&self) -> Duration {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next).max(now);
            *next = slot + self.min_delay;
            slot
        };
        let waited = slot.saturating_duration_since(Instant::now());
        tokio::time::sleep_until(slot).await;
        waited
    }
}
