use crate::backoff::ExponentialBackoff;
use crate::events::QueueEvent;
use crate::window::RateLimit;
use fetch_resilience_core::{EventListeners, FnListener};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for a [`RequestQueue`](crate::RequestQueue).
pub struct QueueConfig {
    pub(crate) name: String,
    pub(crate) tick_interval: Duration,
    pub(crate) politeness_delay: Duration,
    pub(crate) max_window_wait: Duration,
    pub(crate) backoff: ExponentialBackoff,
    pub(crate) default_limit: RateLimit,
    pub(crate) limits: HashMap<String, RateLimit>,
    pub(crate) event_listeners: EventListeners<QueueEvent>,
}

impl QueueConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::new()
    }

    /// Budget for the given operation name.
    pub(crate) fn limit_for(&self, operation: &str) -> RateLimit {
        self.limits
            .get(operation)
            .copied()
            .unwrap_or(self.default_limit)
    }
}

/// Builder for [`QueueConfig`].
pub struct QueueConfigBuilder {
    name: String,
    tick_interval: Duration,
    politeness_delay: Duration,
    max_window_wait: Duration,
    backoff: ExponentialBackoff,
    default_limit: RateLimit,
    limits: HashMap<String, RateLimit>,
    event_listeners: EventListeners<QueueEvent>,
}

impl Default for QueueConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueConfigBuilder {
    /// Creates a builder with defaults.
    ///
    /// Defaults:
    /// - tick_interval: 5 s
    /// - politeness_delay: 250 ms between consecutive requests
    /// - max_window_wait: 60 s per sleep while a budget is exhausted
    /// - backoff: 1 s base, 30 s cap, up to 300 ms jitter
    /// - default_limit: 30 requests per 60 s per operation
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            tick_interval: Duration::from_secs(5),
            politeness_delay: Duration::from_millis(250),
            max_window_wait: Duration::from_secs(60),
            backoff: ExponentialBackoff::default(),
            default_limit: RateLimit::new(30, Duration::from_secs(60)),
            limits: HashMap::new(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Gives this queue a human-readable name for observability.
    ///
    /// Default: `<unnamed>`
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Interval between scheduler wake-ups when the queue is idle.
    ///
    /// Default: 5 s
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Fixed delay applied after each successful request.
    ///
    /// Default: 250 ms
    pub fn politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }

    /// Upper bound for a single sleep while a budget is exhausted.
    ///
    /// Default: 60 s
    pub fn max_window_wait(mut self, wait: Duration) -> Self {
        self.max_window_wait = wait;
        self
    }

    /// Retry backoff policy.
    ///
    /// Default: 1 s base, 30 s cap, up to 300 ms jitter
    pub fn backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Budget for operations without an explicit limit.
    ///
    /// Default: 30 requests per 60 s
    pub fn default_limit(mut self, limit: RateLimit) -> Self {
        self.default_limit = limit;
        self
    }

    /// Budget for one operation name.
    pub fn limit<N: Into<String>>(mut self, operation: N, limit: RateLimit) -> Self {
        self.limits.insert(operation.into(), limit);
        self
    }

    /// Registers a callback for every scheduled retry.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let QueueEvent::RetryScheduled { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback for every rate-limit wait.
    pub fn on_rate_limited<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let QueueEvent::RateLimited {
                operation, wait, ..
            } = event
            {
                f(operation, *wait);
            }
        }));
        self
    }

    /// Registers a callback for clears.
    pub fn on_cleared<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let QueueEvent::Cleared { rejected, .. } = event {
                f(*rejected);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> QueueConfig {
        QueueConfig {
            name: self.name,
            tick_interval: self.tick_interval,
            politeness_delay: self.politeness_delay,
            max_window_wait: self.max_window_wait,
            backoff: self.backoff,
            default_limit: self.default_limit,
            limits: self.limits,
            event_listeners: self.event_listeners,
        }
    }
}
