//! Events emitted by the resilient store.

use fetch_resilience_core::ComponentEvent;
use std::time::Instant;

/// Events emitted by [`ResilientStore`](crate::ResilientStore).
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// The backend failed and the store switched to the fallback map.
    BackendDegraded {
        /// Name of the store instance.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Backend error that triggered the switch.
        reason: String,
    },

    /// A health probe succeeded and the store left degraded mode.
    BackendRestored {
        /// Name of the store instance.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// A read found a sentinel-matching value; the entry was deleted.
    CorruptionDetected {
        /// Name of the store instance.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Key holding the corrupt value.
        key: String,
    },

    /// A write was rejected because the payload matched a sentinel.
    WriteRejected {
        /// Name of the store instance.
        component: String,
        /// When the event occurred.
        timestamp: Instant,
        /// Key the write was addressed to.
        key: String,
    },
}

impl ComponentEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::BackendDegraded { .. } => "backend_degraded",
            Self::BackendRestored { .. } => "backend_restored",
            Self::CorruptionDetected { .. } => "corruption_detected",
            Self::WriteRejected { .. } => "write_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::BackendDegraded { timestamp, .. }
            | Self::BackendRestored { timestamp, .. }
            | Self::CorruptionDetected { timestamp, .. }
            | Self::WriteRejected { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            Self::BackendDegraded { component, .. }
            | Self::BackendRestored { component, .. }
            | Self::CorruptionDetected { component, .. }
            | Self::WriteRejected { component, .. } => component,
        }
    }
}
