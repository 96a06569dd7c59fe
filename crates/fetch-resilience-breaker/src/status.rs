//! Persisted breaker status.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls are allowed; consecutive failures are counted.
    Closed,
    /// Calls are denied until the recovery timeout elapses.
    Open,
    /// A single trial call is probing the resource.
    HalfOpen,
}

/// The full persisted status of one breaker.
///
/// Serialized through the cache's single `serde_json` path; wall-clock
/// timestamps (unix milliseconds) are used so the record stays meaningful
/// across process restarts and between processes sharing a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerStatus {
    /// Name of the protected resource.
    pub name: String,
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures observed since the last success or reset.
    pub failure_count: u32,
    /// When the most recent failure was recorded.
    pub last_failure_at_ms: Option<u64>,
    /// When an open circuit will admit its next trial call.
    pub next_attempt_at_ms: Option<u64>,
    /// When set, the state machine never denies calls.
    pub manual_override: bool,
}

impl BreakerStatus {
    /// A fresh closed status for the named resource.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_at_ms: None,
            next_attempt_at_ms: None,
            manual_override: false,
        }
    }

    /// Whether an open circuit is due for its half-open trial.
    pub fn recovery_due(&self, now_ms: u64) -> bool {
        self.state == CircuitState::Open && now_ms >= self.next_attempt_at_ms.unwrap_or(0)
    }
}

/// Current wall-clock time as unix milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_json() {
        let status = BreakerStatus {
            name: "primary-api".into(),
            state: CircuitState::HalfOpen,
            failure_count: 4,
            last_failure_at_ms: Some(1_700_000_000_000),
            next_attempt_at_ms: Some(1_700_000_300_000),
            manual_override: false,
        };

        let raw = serde_json::to_string(&status).unwrap();
        let decoded: BreakerStatus = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded, status);
    }

    #[test]
    fn state_uses_snake_case_tags() {
        assert_eq!(
            serde_json::to_string(&CircuitState::HalfOpen).unwrap(),
            r#""half_open""#
        );
        assert_eq!(
            serde_json::from_str::<CircuitState>(r#""open""#).unwrap(),
            CircuitState::Open
        );
    }

    #[test]
    fn recovery_due_requires_open_and_elapsed_timer() {
        let mut status = BreakerStatus::new("x");
        assert!(!status.recovery_due(1_000));

        status.state = CircuitState::Open;
        status.next_attempt_at_ms = Some(2_000);
        assert!(!status.recovery_due(1_999));
        assert!(status.recovery_due(2_000));
    }
}
