//! Events emitted by the request queue.

use fetch_resilience_core::ComponentEvent;
use std::time::{Duration, Instant};

/// Events emitted by [`RequestQueue`](crate::RequestQueue).
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A request was accepted into the queue.
    Enqueued {
        /// Queue name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation name of the request.
        operation: String,
        /// Priority of the request.
        priority: i32,
        /// Queue depth after the insert.
        depth: usize,
    },

    /// A request completed and its handle was resolved.
    Completed {
        /// Queue name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation name of the request.
        operation: String,
        /// Attempts made, including the first.
        attempts: u32,
    },

    /// A retryable failure was re-enqueued with a backoff delay.
    RetryScheduled {
        /// Queue name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation name of the request.
        operation: String,
        /// Retry number about to be made (1-indexed).
        attempt: u32,
        /// Delay before the retry.
        delay: Duration,
    },

    /// The front request's budget is exhausted; the scheduler is waiting.
    RateLimited {
        /// Queue name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation name of the request.
        operation: String,
        /// How long the scheduler will sleep (already capped).
        wait: Duration,
    },

    /// A request failed permanently and its handle was rejected.
    RequestFailed {
        /// Queue name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Operation name of the request.
        operation: String,
        /// Attempts made, including the first.
        attempts: u32,
    },

    /// Pending requests were rejected by a clear.
    Cleared {
        /// Queue name.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Number of requests rejected.
        rejected: usize,
    },
}

impl ComponentEvent for QueueEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Enqueued { .. } => "enqueued",
            Self::Completed { .. } => "completed",
            Self::RetryScheduled { .. } => "retry_scheduled",
            Self::RateLimited { .. } => "rate_limited",
            Self::RequestFailed { .. } => "request_failed",
            Self::Cleared { .. } => "cleared",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Enqueued { timestamp, .. }
            | Self::Completed { timestamp, .. }
            | Self::RetryScheduled { timestamp, .. }
            | Self::RateLimited { timestamp, .. }
            | Self::RequestFailed { timestamp, .. }
            | Self::Cleared { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            Self::Enqueued { component, .. }
            | Self::Completed { component, .. }
            | Self::RetryScheduled { component, .. }
            | Self::RateLimited { component, .. }
            | Self::RequestFailed { component, .. }
            | Self::Cleared { component, .. } => component,
        }
    }
}
