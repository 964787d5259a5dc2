use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

/// Refreshes allowed per window by default.
pub const DEFAULT_REFRESH_LIMIT: u32 = 50;
/// Default refresh window: seven minutes.
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(7 * 60);

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Caller-side throttle on how often fetch cycles may start.
///
/// The full budget is available as a burst and refills evenly across the window.
#[derive(Clone)]
pub struct RefreshLimiter {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
}

impl Default for RefreshLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_WINDOW, DEFAULT_REFRESH_LIMIT)
    }
}

impl RefreshLimiter {
    pub fn new(window: Duration, limit: u32) -> Self {
        let clock = DefaultClock::default();
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, limit))),
            clock,
        }
    }

    /// Takes one refresh from the budget, or returns how long to wait for the next one.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        match self.limiter.check() {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                tracing::debug!(wait_ms = wait.as_millis() as u64, "refresh budget exhausted");
                Err(wait)
            }
        }
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
    let period = window
        .checked_div(burst.get())
        .filter(|period| !period.is_zero())
        .unwrap_or(Duration::from_millis(1));

    Quota::with_period(period)
        .map_or_else(|| Quota::per_second(burst), |quota| quota.allow_burst(burst))
}
