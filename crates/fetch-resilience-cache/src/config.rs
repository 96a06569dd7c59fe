use crate::events::CacheEvent;
use fetch_resilience_core::{EventListeners, FnListener};

/// Configuration for a [`ResilientStore`](crate::ResilientStore).
pub struct CacheConfig {
    pub(crate) name: String,
    pub(crate) fallback_capacity: usize,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    name: String,
    fallback_capacity: usize,
    event_listeners: EventListeners<CacheEvent>,
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - fallback_capacity: 1000 entries
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            fallback_capacity: 1000,
            event_listeners: EventListeners::new(),
        }
    }

    /// Gives this store a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the maximum number of entries kept in the in-process fallback
    /// map while the backend is unreachable. When full, the entry with the
    /// oldest expiry is evicted.
    ///
    /// Default: 1000
    pub fn fallback_capacity(mut self, capacity: usize) -> Self {
        self.fallback_capacity = capacity.max(1);
        self
    }

    /// Registers a callback for when the store enters degraded mode.
    pub fn on_degraded<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::BackendDegraded { reason, .. } = event {
                f(reason);
            }
        }));
        self
    }

    /// Registers a callback for when a probe returns the store to the
    /// backend.
    pub fn on_restored<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::BackendRestored { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback for every corrupt entry found on read.
    pub fn on_corruption<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::CorruptionDetected { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CacheConfig {
        CacheConfig {
            name: self.name,
            fallback_capacity: self.fallback_capacity,
            event_listeners: self.event_listeners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = CacheConfig::builder().build();
        assert_eq!(config.fallback_capacity, 1000);
        assert_eq!(config.name, "<unnamed>");
    }

    #[test]
    fn capacity_is_never_zero() {
        let config = CacheConfig::builder().fallback_capacity(0).build();
        assert_eq!(config.fallback_capacity, 1);
    }
}
