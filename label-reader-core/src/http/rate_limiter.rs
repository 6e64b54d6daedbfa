//! Per-host politeness delay.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Spaces out requests to the same host by at least `min_delay`.
///
/// Workers hitting the same host reserve consecutive slots, so six workers
/// querying one API are serialized to one request per `min_delay`.
pub struct RateLimiter {
    min_delay: Duration,
    /// Earliest instant the next request to each host may start.
    next_slot: DashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            next_slot: DashMap::new(),
        }
    }

    /// A limiter that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait for this host's next free slot.
    pub async fn wait(&self, host: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        let now = Instant::now();
        // Reserve under the shard lock, sleep after releasing it.
        let start = {
            let mut slot = self.next_slot.entry(host.to_string()).or_insert(now);
            let start = (*slot).max(now);
            *slot = start + self.min_delay;
            start
        };

        if start > now {
            tracing::trace!(host, wait_ms = (start - now).as_millis() as u64, "rate limited");
            sleep_until(start).await;
        }
    }

    pub fn tracked_hosts(&self) -> usize {
        self.next_slot.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}
