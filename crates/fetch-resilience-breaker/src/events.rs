//! Events emitted by a circuit breaker.

use crate::status::CircuitState;
use fetch_resilience_core::ComponentEvent;
use std::time::Instant;

/// Events emitted by [`CircuitBreaker`](crate::CircuitBreaker).
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    /// The breaker moved between states.
    StateTransition {
        /// Breaker name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State before the transition.
        from: CircuitState,
        /// State after the transition.
        to: CircuitState,
    },

    /// A call was admitted.
    CallPermitted {
        /// Breaker name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State at admission time.
        state: CircuitState,
    },

    /// A call was denied without running.
    CallRejected {
        /// Breaker name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// An admitted call succeeded.
    SuccessRecorded {
        /// Breaker name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State at recording time.
        state: CircuitState,
    },

    /// An admitted call failed.
    FailureRecorded {
        /// Breaker name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// State at recording time.
        state: CircuitState,
    },
}

impl ComponentEvent for BreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::StateTransition { .. } => "state_transition",
            Self::CallPermitted { .. } => "call_permitted",
            Self::CallRejected { .. } => "call_rejected",
            Self::SuccessRecorded { .. } => "success_recorded",
            Self::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::StateTransition { timestamp, .. }
            | Self::CallPermitted { timestamp, .. }
            | Self::CallRejected { timestamp, .. }
            | Self::SuccessRecorded { timestamp, .. }
            | Self::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            Self::StateTransition { component, .. }
            | Self::CallPermitted { component, .. }
            | Self::CallRejected { component, .. }
            | Self::SuccessRecorded { component, .. }
            | Self::FailureRecorded { component, .. } => component,
        }
    }
}
