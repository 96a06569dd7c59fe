use crate::events::OrchestratorEvent;
use fetch_resilience_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for an [`Orchestrator`](crate::Orchestrator).
pub struct OrchestratorConfig {
    pub(crate) name: String,
    pub(crate) call_timeout: Duration,
    pub(crate) max_retries_per_source: u32,
    pub(crate) rate_limit_cooldown: Duration,
    pub(crate) post_ttl: Duration,
    pub(crate) engagement_ttl: Duration,
    pub(crate) preferred_source: Option<String>,
    pub(crate) event_listeners: EventListeners<OrchestratorEvent>,
}

impl OrchestratorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::new()
    }
}

/// Builder for [`OrchestratorConfig`].
pub struct OrchestratorConfigBuilder {
    name: String,
    call_timeout: Duration,
    max_retries_per_source: u32,
    rate_limit_cooldown: Duration,
    post_ttl: Duration,
    engagement_ttl: Duration,
    preferred_source: Option<String>,
    event_listeners: EventListeners<OrchestratorEvent>,
}

impl Default for OrchestratorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - call_timeout: 10 s per source attempt
    /// - max_retries_per_source: 2 queue retries
    /// - rate_limit_cooldown: 15 minutes
    /// - post_ttl: 300 s, engagement_ttl: 60 s
    /// - preferred_source: first in the configured list
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            call_timeout: Duration::from_secs(10),
            max_retries_per_source: 2,
            rate_limit_cooldown: Duration::from_secs(900),
            post_ttl: Duration::from_secs(300),
            engagement_ttl: Duration::from_secs(60),
            preferred_source: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Gives this orchestrator a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Deadline for one source attempt; exceeding it counts as a retryable
    /// timeout failure.
    ///
    /// Default: 10 s
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Queue retries per source before falling through to the next one.
    ///
    /// Default: 2
    pub fn max_retries_per_source(mut self, retries: u32) -> Self {
        self.max_retries_per_source = retries;
        self
    }

    /// How long a quota-limited source is skipped before being probed again.
    ///
    /// Default: 15 minutes
    pub fn rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    /// TTL for cached post payloads.
    ///
    /// Default: 300 s
    pub fn post_ttl(mut self, ttl: Duration) -> Self {
        self.post_ttl = ttl;
        self
    }

    /// TTL for cached engagement snapshots.
    ///
    /// Default: 60 s
    pub fn engagement_ttl(mut self, ttl: Duration) -> Self {
        self.engagement_ttl = ttl;
        self
    }

    /// Moves the named source to the front of the order.
    ///
    /// Default: the configured list order is kept.
    pub fn preferred_source<N: Into<String>>(mut self, name: N) -> Self {
        self.preferred_source = Some(name.into());
        self
    }

    /// Registers a callback for every started rate-limit cooldown.
    pub fn on_source_rate_limited<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let OrchestratorEvent::SourceRateLimited {
                source, cooldown, ..
            } = event
            {
                f(source, *cooldown);
            }
        }));
        self
    }

    /// Registers a callback for every failed source attempt.
    pub fn on_source_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let OrchestratorEvent::SourceFailed { source, .. } = event {
                f(source);
            }
        }));
        self
    }

    /// Registers a callback for every exhausted fetch.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let OrchestratorEvent::Exhausted { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OrchestratorConfig {
        OrchestratorConfig {
            name: self.name,
            call_timeout: self.call_timeout,
            max_retries_per_source: self.max_retries_per_source,
            rate_limit_cooldown: self.rate_limit_cooldown,
            post_ttl: self.post_ttl,
            engagement_ttl: self.engagement_ttl,
            preferred_source: self.preferred_source,
            event_listeners: self.event_listeners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = OrchestratorConfig::builder().build();
        assert_eq!(config.call_timeout, Duration::from_secs(10));
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(900));
        assert_eq!(config.post_ttl, Duration::from_secs(300));
        assert_eq!(config.engagement_ttl, Duration::from_secs(60));
        assert_eq!(config.max_retries_per_source, 2);
        assert!(config.preferred_source.is_none());
    }
}
