use crate::events::BreakerEvent;
use crate::status::CircuitState;
use fetch_resilience_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration shared by the breakers of one registry.
#[derive(Clone)]
pub struct BreakerConfig {
    pub(crate) failure_threshold: u32,
    pub(crate) recovery_timeout: Duration,
    pub(crate) half_open_max_calls: usize,
    pub(crate) status_ttl: Duration,
    pub(crate) event_listeners: EventListeners<BreakerEvent>,
}

impl BreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BreakerConfigBuilder {
        BreakerConfigBuilder::new()
    }
}

/// Builder for [`BreakerConfig`].
pub struct BreakerConfigBuilder {
    failure_threshold: u32,
    recovery_timeout: Duration,
    half_open_max_calls: usize,
    status_ttl: Duration,
    event_listeners: EventListeners<BreakerEvent>,
}

impl Default for BreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - failure_threshold: 5 consecutive failures
    /// - recovery_timeout: 5 minutes
    /// - half_open_max_calls: 1
    /// - status_ttl: 24 hours
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(300),
            half_open_max_calls: 1,
            status_ttl: Duration::from_secs(86_400),
            event_listeners: EventListeners::new(),
        }
    }

    /// Consecutive failures that open the circuit.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// How long an open circuit waits before admitting a trial call.
    ///
    /// Default: 5 minutes
    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    /// Trial calls admitted concurrently in the half-open state.
    ///
    /// Default: 1 (exactly one trial in flight)
    pub fn half_open_max_calls(mut self, calls: usize) -> Self {
        self.half_open_max_calls = calls.max(1);
        self
    }

    /// TTL of the persisted status record.
    ///
    /// Default: 24 hours
    pub fn status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = ttl;
        self
    }

    /// Registers a callback for state transitions.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BreakerEvent::StateTransition { from, to, .. } = event {
                f(*from, *to);
            }
        }));
        self
    }

    /// Registers a callback for calls denied by the circuit.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, BreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback for recorded failures.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BreakerEvent::FailureRecorded { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: self.recovery_timeout,
            half_open_max_calls: self.half_open_max_calls,
            status_ttl: self.status_ttl,
            event_listeners: self.event_listeners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = BreakerConfig::builder().build();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(300));
        assert_eq!(config.half_open_max_calls, 1);
    }

    #[test]
    fn zero_values_are_clamped() {
        let config = BreakerConfig::builder()
            .failure_threshold(0)
            .half_open_max_calls(0)
            .build();
        assert_eq!(config.failure_threshold, 1);
        assert_eq!(config.half_open_max_calls, 1);
    }
}
