//! Events emitted by the orchestrator.

use fetch_resilience_core::{ComponentEvent, ErrorKind};
use std::time::{Duration, Instant};

/// Why a source was passed over without an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source's circuit breaker is open.
    BreakerOpen,
    /// A rate-limit cooldown is still active.
    CoolingDown,
}

/// Events emitted by [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// A read was answered from the cache.
    CacheHit {
        /// Orchestrator name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Cache key that hit.
        key: String,
    },

    /// A source attempt produced data.
    SourceSucceeded {
        /// Orchestrator name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Source tag.
        source: String,
        /// Attempt duration.
        latency: Duration,
    },

    /// A source attempt failed.
    SourceFailed {
        /// Orchestrator name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Source tag.
        source: String,
        /// Failure classification.
        kind: ErrorKind,
    },

    /// A source was skipped without an attempt.
    SourceSkipped {
        /// Orchestrator name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Source tag.
        source: String,
        /// Why it was skipped.
        reason: SkipReason,
    },

    /// A quota error started a rate-limit cooldown for a source.
    SourceRateLimited {
        /// Orchestrator name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Source tag.
        source: String,
        /// Cooldown length.
        cooldown: Duration,
    },

    /// Every eligible source failed for a key.
    Exhausted {
        /// Orchestrator name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Cache key of the requested entity.
        key: String,
    },
}

impl ComponentEvent for OrchestratorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::CacheHit { .. } => "cache_hit",
            Self::SourceSucceeded { .. } => "source_succeeded",
            Self::SourceFailed { .. } => "source_failed",
            Self::SourceSkipped { .. } => "source_skipped",
            Self::SourceRateLimited { .. } => "source_rate_limited",
            Self::Exhausted { .. } => "exhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::CacheHit { timestamp, .. }
            | Self::SourceSucceeded { timestamp, .. }
            | Self::SourceFailed { timestamp, .. }
            | Self::SourceSkipped { timestamp, .. }
            | Self::SourceRateLimited { timestamp, .. }
            | Self::Exhausted { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            Self::CacheHit { component, .. }
            | Self::SourceSucceeded { component, .. }
            | Self::SourceFailed { component, .. }
            | Self::SourceSkipped { component, .. }
            | Self::SourceRateLimited { component, .. }
            | Self::Exhausted { component, .. } => component,
        }
    }
}
