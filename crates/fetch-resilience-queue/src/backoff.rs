//! Exponential backoff with jitter for retry delays.

use std::time::Duration;

/// Computes `base * 2^attempt + jitter`, capped at `cap`.
///
/// Jitter is uniform in `[0, max_jitter]` and applied after the cap, so the
/// cap bounds the deterministic part and jitter keeps concurrent retriers
/// from synchronizing.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    max_jitter: Duration,
}

impl ExponentialBackoff {
    /// Creates a backoff policy.
    pub fn new(base: Duration, cap: Duration, max_jitter: Duration) -> Self {
        Self {
            base,
            cap,
            max_jitter,
        }
    }

    /// Delay before retry number `attempt` (0-indexed: the first retry uses
    /// `attempt = 0`).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        let exponential = self.base.saturating_mul(factor).min(self.cap);
        exponential + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        use rand::Rng;
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}

impl Default for ExponentialBackoff {
    /// 1 s base, 30 s cap, up to 300 ms of jitter.
    fn default() -> Self {
        Self::new(
            Duration::from_secs(1),
            Duration::from_secs(30),
            Duration::from_millis(300),
        )
    }
}
