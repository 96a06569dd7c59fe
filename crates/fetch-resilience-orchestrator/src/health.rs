//! Read-only health snapshot of the acquisition layer.

use fetch_resilience_breaker::CircuitState;
use serde::Serialize;

/// Point-in-time view of the whole layer. Producing one has no side effects.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    /// Source the next fetch would try first, if any is eligible.
    pub preferred_source: Option<String>,
    /// Requests waiting in the queue.
    pub queue_depth: usize,
    /// Per-source detail, in preference order.
    pub sources: Vec<SourceHealth>,
}

/// Health detail for one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceHealth {
    /// Source tag.
    pub name: String,
    /// Breaker state for this source.
    pub breaker_state: CircuitState,
    /// Consecutive failures recorded by the breaker.
    pub consecutive_failures: u32,
    /// Remaining rate-limit cooldown in milliseconds, when active.
    pub cooling_down_ms: Option<u64>,
    /// Rolling success rate over recent attempts (1.0 with no attempts).
    pub success_rate: f64,
    /// Rolling mean attempt latency in milliseconds.
    pub mean_latency_ms: u64,
    /// Attempts currently in the rolling window.
    pub attempts: usize,
    /// Failures currently in the rolling window.
    pub recent_failures: usize,
}
