//! Rolling per-source attempt statistics.

use fetch_resilience_core::ErrorKind;
use std::collections::VecDeque;
use std::time::Duration;

/// Records kept per source; older attempts fall off the window.
const ATTEMPT_WINDOW: usize = 1000;

/// Outcome of one attempt against a source.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Whether the attempt produced data.
    pub success: bool,
    /// Wall-clock duration of the attempt.
    pub latency: Duration,
    /// Classification of the failure, when there was one.
    pub error_kind: Option<ErrorKind>,
}

/// Bounded ring buffer of recent attempts for one source.
#[derive(Debug, Default)]
pub(crate) struct SourceStats {
    records: VecDeque<AttemptRecord>,
}

impl SourceStats {
    pub(crate) fn record(&mut self, record: AttemptRecord) {
        if self.records.len() >= ATTEMPT_WINDOW {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Fraction of recent attempts that succeeded; 1.0 with no evidence.
    pub(crate) fn success_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 1.0;
        }
        let successes = self.records.iter().filter(|r| r.success).count();
        successes as f64 / self.records.len() as f64
    }

    /// Mean latency over the window.
    pub(crate) fn mean_latency(&self) -> Duration {
        if self.records.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.records.iter().map(|r| r.latency).sum();
        total / self.records.len() as u32
    }

    pub(crate) fn attempts(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn failures(&self) -> usize {
        self.records.iter().filter(|r| !r.success).count()
    }
}
