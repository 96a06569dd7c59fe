//! Fixed request budget per operation over a rolling window.

use std::time::Duration;
use tokio::time::Instant;

/// Request budget for one operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimit {
    /// Creates a budget of `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
        }
    }
}

/// Consumption counter against one [`RateLimit`].
///
/// The counter resets lazily: the first check at or past `reset_at` starts a
/// fresh window.
#[derive(Debug)]
pub(crate) struct RateWindow {
    limit: RateLimit,
    count: u32,
    reset_at: Instant,
}

impl RateWindow {
    pub(crate) fn new(limit: RateLimit, now: Instant) -> Self {
        Self {
            limit,
            count: 0,
            reset_at: now + limit.window,
        }
    }

    fn roll(&mut self, now: Instant) {
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + self.limit.window;
        }
    }

    /// `None` when the budget admits another request, otherwise the wait
    /// until the window resets.
    pub(crate) fn time_until_ready(&mut self, now: Instant) -> Option<Duration> {
        self.roll(now);
        if self.count < self.limit.max_requests {
            None
        } else {
            Some(self.reset_at - now)
        }
    }

    /// Counts one executed request against the budget.
    pub(crate) fn record(&mut self, now: Instant) {
        self.roll(now);
        self.count = self.count.saturating_add(1);
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(max: u32, secs: u64) -> RateLimit {
        RateLimit::new(max, Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn budget_admits_until_exhausted() {
        let now = Instant::now();
        let mut window = RateWindow::new(limit(2, 60), now);

        assert_eq!(window.time_until_ready(now), None);
        window.record(now);
        assert_eq!(window.time_until_ready(now), None);
        window.record(now);

        // Exhausted: wait runs to the end of the window.
        assert_eq!(window.time_until_ready(now), Some(Duration::from_secs(60)));
        assert_eq!(window.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn count_resets_exactly_at_the_boundary() {
        let now = Instant::now();
        let mut window = RateWindow::new(limit(1, 60), now);
        window.record(now);

        let just_before = now + Duration::from_secs(60) - Duration::from_millis(1);
        assert!(window.time_until_ready(just_before).is_some());

        let boundary = now + Duration::from_secs(60);
        assert_eq!(window.time_until_ready(boundary), None);
        assert_eq!(window.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn count_never_exceeds_the_budget_within_a_window() {
        let now = Instant::now();
        let mut window = RateWindow::new(limit(3, 60), now);

        for _ in 0..3 {
            assert!(window.time_until_ready(now).is_none());
            window.record(now);
        }
        assert!(window.time_until_ready(now).is_some());
        assert_eq!(window.count(), 3);
    }

    #[test]
    fn zero_budget_is_clamped_to_one() {
        assert_eq!(RateLimit::new(0, Duration::from_secs(1)).max_requests, 1);
    }
}
