//! Pacing for provider-bound batch work.
//!
//! A token bucket expressed as a "theoretical arrival time": each caller
//! reserves the next free slot under the lock and then sleeps until it,
//! so concurrent callers are spaced out too. Built on [`tokio::time`] so
//! tests can drive it with a paused clock.

use crate::config::SyncConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateLimiter {
    /// `None` disables pacing.
    interval: Option<Duration>,
    /// How far ahead of the steady rate callers may run (`burst - 1` slots).
    tolerance: Duration,
    next_free: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// One slot every `interval`, with up to `burst` slots back-to-back.
    #[must_use]
    pub fn new(interval: Duration, burst: u32) -> Self {
        let interval = (!interval.is_zero()).then_some(interval);
        let tolerance = interval.map_or(Duration::ZERO, |i| i * burst.saturating_sub(1));

        Self {
            interval,
            tolerance,
            next_free: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(Duration::from_millis(config.pacing_ms), config.burst)
    }

    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO, 1)
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval.unwrap_or_default()
    }

    /// Waits for the next slot.
    pub async fn acquire(&self) {
        let Some(interval) = self.interval else {
            return;
        };

        let start = {
            let mut next_free = self.next_free.lock().await;
            let now = Instant::now();
            let tat = next_free.map_or(now, |t| t.max(now));
            let start = tat
                .checked_sub(self.tolerance)
                .map_or(now, |earliest| earliest.max(now));
            *next_free = Some(tat + interval);
            start
        };

        if start > Instant::now() {
            tokio::time::sleep_until(start).await;
        }
    }
}
