//! The orchestrator: preference walk, cooldowns, caching, batch fetch.

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, SourceFailure};
use crate::events::{OrchestratorEvent, SkipReason};
use crate::health::{HealthSnapshot, SourceHealth};
use crate::model::{EngagementSnapshot, PostData, PostRequest};
use crate::source::PostSource;
use crate::stats::{AttemptRecord, SourceStats};
use fetch_resilience_breaker::{BreakerError, BreakerRegistry, CircuitState};
use fetch_resilience_cache::ResilientStore;
use fetch_resilience_core::{keys, FetchError};
use fetch_resilience_queue::{QueueError, RequestQueue};
#[cfg(feature = "metrics")]
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::{debug, info, warn};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

struct PreferenceState {
    cooldowns: HashMap<String, Instant>,
    stats: HashMap<String, SourceStats>,
}

/// Drives an ordered list of sources through breaker, queue, and cache.
///
/// See the crate docs for construction; the orchestrator borrows nothing
/// global — store, breaker registry, and queue are injected.
pub struct Orchestrator {
    sources: Vec<Arc<dyn PostSource>>,
    store: Arc<ResilientStore>,
    breakers: Arc<BreakerRegistry>,
    queue: RequestQueue<PostData>,
    config: OrchestratorConfig,
    state: Arc<Mutex<PreferenceState>>,
}

impl Orchestrator {
    /// Creates an orchestrator over the given sources, in preference order.
    ///
    /// When `preferred_source` names one of the sources it is moved to the
    /// front; the rest keep their relative order.
    pub fn new(
        mut sources: Vec<Arc<dyn PostSource>>,
        store: Arc<ResilientStore>,
        breakers: Arc<BreakerRegistry>,
        queue: RequestQueue<PostData>,
        config: OrchestratorConfig,
    ) -> Self {
        if let Some(preferred) = &config.preferred_source {
            if let Some(pos) = sources.iter().position(|s| s.name() == preferred.as_str()) {
                let source = sources.remove(pos);
                sources.insert(0, source);
            }
        }
        Self {
            sources,
            store,
            breakers,
            queue,
            config,
            state: Arc::new(Mutex::new(PreferenceState {
                cooldowns: HashMap::new(),
                stats: HashMap::new(),
            })),
        }
    }

    /// Cache-only read of a previously fetched post, by cache key.
    pub async fn get_data(&self, key: &str) -> Option<PostData> {
        self.store.get(key).await
    }

    /// Fetches one post, walking sources in preference order.
    ///
    /// Reads through the cache; a successful fetch is cached under
    /// `post:<id>` tagged with the producing source before being returned.
    pub async fn fetch(&self, request: &PostRequest) -> Result<PostData, OrchestratorError> {
        let post_id = request
            .post_id()
            .map_err(OrchestratorError::InvalidRequest)?
            .to_string();
        let key = keys::post(&post_id);

        if let Some(cached) = self.store.get::<PostData>(&key).await {
            self.emit_cache_hit(&key);
            return Ok(cached);
        }

        let mut attempts = Vec::new();
        for idx in 0..self.sources.len() {
            let name = self.sources[idx].name().to_string();
            if let Some(reason) = self.skip_reason(&name).await {
                self.emit_skipped(&name, reason);
                continue;
            }

            match self.attempt(idx, request).await {
                Ok(mut data) => {
                    data.source = name;
                    self.cache_post(&key, &data).await;
                    return Ok(data);
                }
                Err(error) => {
                    if error.is_rate_limited() {
                        self.mark_rate_limited(&name).await;
                    }
                    attempts.push(SourceFailure {
                        source: name,
                        error,
                    });
                }
            }
        }

        warn!(orchestrator = %self.config.name, key = %key, "every source failed or was skipped");
        self.config.event_listeners.emit(&OrchestratorEvent::Exhausted {
            component: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            key: key.clone(),
        });
        Err(OrchestratorError::Exhausted { key, attempts })
    }

    /// Fetches a batch of posts.
    ///
    /// The whole batch is attempted against the preferred source; only when
    /// its success rate on the batch drops below 50% do the still-unresolved
    /// requests fall through to the next source, as a unit.
    pub async fn fetch_batch(
        &self,
        requests: &[PostRequest],
    ) -> Vec<Result<PostData, OrchestratorError>> {
        let mut slots: Vec<Option<Result<PostData, OrchestratorError>>> =
            requests.iter().map(|_| None).collect();
        let mut failures: HashMap<usize, Vec<SourceFailure>> = HashMap::new();

        for (i, request) in requests.iter().enumerate() {
            match request.post_id() {
                Ok(id) => {
                    let key = keys::post(id);
                    if let Some(cached) = self.store.get::<PostData>(&key).await {
                        self.emit_cache_hit(&key);
                        slots[i] = Some(Ok(cached));
                    }
                }
                Err(err) => slots[i] = Some(Err(OrchestratorError::InvalidRequest(err))),
            }
        }

        for idx in 0..self.sources.len() {
            let unresolved: Vec<usize> = slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_none())
                .map(|(i, _)| i)
                .collect();
            if unresolved.is_empty() {
                break;
            }

            let name = self.sources[idx].name().to_string();
            if let Some(reason) = self.skip_reason(&name).await {
                self.emit_skipped(&name, reason);
                continue;
            }

            let mut successes = 0usize;
            for &i in &unresolved {
                match self.attempt(idx, &requests[i]).await {
                    Ok(mut data) => {
                        data.source = name.clone();
                        // The id parsed earlier, or the slot would be filled.
                        if let Ok(id) = requests[i].post_id() {
                            self.cache_post(&keys::post(id), &data).await;
                        }
                        slots[i] = Some(Ok(data));
                        successes += 1;
                    }
                    Err(error) => {
                        if error.is_rate_limited() {
                            self.mark_rate_limited(&name).await;
                        }
                        failures.entry(i).or_default().push(SourceFailure {
                            source: name.clone(),
                            error,
                        });
                    }
                }
            }

            let rate = successes as f64 / unresolved.len() as f64;
            if rate >= 0.5 {
                break;
            }
            debug!(
                orchestrator = %self.config.name,
                source = %name,
                rate,
                "batch success rate below half, falling through as a unit"
            );
        }

        let mut results = Vec::with_capacity(requests.len());
        for (i, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(result) => results.push(result),
                None => {
                    let key = requests[i]
                        .post_id()
                        .map(keys::post)
                        .unwrap_or_else(|_| requests[i].url.clone());
                    self.config.event_listeners.emit(&OrchestratorEvent::Exhausted {
                        component: self.config.name.clone(),
                        timestamp: std::time::Instant::now(),
                        key: key.clone(),
                    });
                    results.push(Err(OrchestratorError::Exhausted {
                        key,
                        attempts: failures.remove(&i).unwrap_or_default(),
                    }));
                }
            }
        }
        results
    }

    /// Engagement-only view of a post, cached under `engagement:<id>` with
    /// the short TTL.
    pub async fn engagement(
        &self,
        request: &PostRequest,
    ) -> Result<EngagementSnapshot, OrchestratorError> {
        let post_id = request
            .post_id()
            .map_err(OrchestratorError::InvalidRequest)?
            .to_string();
        let key = keys::engagement(&post_id);

        if let Some(cached) = self.store.get::<EngagementSnapshot>(&key).await {
            self.emit_cache_hit(&key);
            return Ok(cached);
        }

        let data = self.fetch(request).await?;
        let snapshot = EngagementSnapshot::from(&data);
        if let Err(err) = self
            .store
            .set(&key, &snapshot, self.config.engagement_ttl)
            .await
        {
            debug!(orchestrator = %self.config.name, key = %key, error = %err, "engagement snapshot not cached");
        }
        Ok(snapshot)
    }

    /// Side-effect-free snapshot of sources, breakers, and queue.
    pub async fn health(&self) -> HealthSnapshot {
        let now = Instant::now();
        let wall_now = now_ms();
        let mut sources = Vec::with_capacity(self.sources.len());
        let mut preferred_source = None;

        for source in &self.sources {
            let name = source.name().to_string();
            let status = self.breakers.breaker(&name).status().await;

            let cooling_down_ms = {
                let state = self.state.lock().unwrap();
                state
                    .cooldowns
                    .get(&name)
                    .filter(|until| **until > now)
                    .map(|until| (*until - now).as_millis() as u64)
            };
            let (success_rate, mean_latency_ms, attempts, recent_failures) = {
                let state = self.state.lock().unwrap();
                match state.stats.get(&name) {
                    Some(stats) => (
                        stats.success_rate(),
                        stats.mean_latency().as_millis() as u64,
                        stats.attempts(),
                        stats.failures(),
                    ),
                    None => (1.0, 0, 0, 0),
                }
            };

            let blocked = cooling_down_ms.is_some()
                || (status.state == CircuitState::Open
                    && !status.manual_override
                    && !status.recovery_due(wall_now));
            if preferred_source.is_none() && !blocked {
                preferred_source = Some(name.clone());
            }

            sources.push(SourceHealth {
                name,
                breaker_state: status.state,
                consecutive_failures: status.failure_count,
                cooling_down_ms,
                success_rate,
                mean_latency_ms,
                attempts,
                recent_failures,
            });
        }

        HealthSnapshot {
            preferred_source,
            queue_depth: self.queue.depth(),
            sources,
        }
    }

    /// One attempt against one source: queued, breaker-wrapped, timed.
    async fn attempt(&self, idx: usize, request: &PostRequest) -> Result<PostData, FetchError> {
        let source = Arc::clone(&self.sources[idx]);
        let name = source.name().to_string();
        let breaker = self.breakers.breaker(&name);
        let timeout = self.config.call_timeout;
        let request = request.clone();
        let state = Arc::clone(&self.state);
        let listeners = self.config.event_listeners.clone();
        let component = self.config.name.clone();
        let operation = format!("{name}:fetch");

        let handle = self.queue.enqueue(
            operation,
            request.priority,
            self.config.max_retries_per_source,
            move || {
                let source = Arc::clone(&source);
                let breaker = Arc::clone(&breaker);
                let request = request.clone();
                let state = Arc::clone(&state);
                let listeners = listeners.clone();
                let component = component.clone();
                let name = source.name().to_string();
                async move {
                    let started = std::time::Instant::now();
                    let result = breaker
                        .execute(|| async {
                            match tokio::time::timeout(timeout, source.fetch(&request)).await {
                                Ok(result) => result,
                                Err(_) => Err(FetchError::Timeout(timeout)),
                            }
                        })
                        .await
                        .map_err(|err| match err {
                            BreakerError::Open { resource, .. } => {
                                FetchError::CircuitOpen { resource }
                            }
                            BreakerError::Inner(inner) => inner,
                        });
                    let latency = started.elapsed();

                    state
                        .lock()
                        .unwrap()
                        .stats
                        .entry(name.clone())
                        .or_default()
                        .record(AttemptRecord {
                            success: result.is_ok(),
                            latency,
                            error_kind: result.as_ref().err().map(|e| e.kind()),
                        });

                    match &result {
                        Ok(_) => {
                            #[cfg(feature = "metrics")]
                            counter!("orchestrator_attempts_total", "source" => name.clone(), "outcome" => "success").increment(1);
                            listeners.emit(&OrchestratorEvent::SourceSucceeded {
                                component,
                                timestamp: std::time::Instant::now(),
                                source: name,
                                latency,
                            });
                        }
                        Err(err) => {
                            #[cfg(feature = "metrics")]
                            counter!("orchestrator_attempts_total", "source" => name.clone(), "outcome" => "failure").increment(1);
                            debug!(source = %name, error = %err, "source attempt failed");
                            listeners.emit(&OrchestratorEvent::SourceFailed {
                                component,
                                timestamp: std::time::Instant::now(),
                                source: name,
                                kind: err.kind(),
                            });
                        }
                    }
                    result
                }
            },
        );

        handle.await.map_err(|err| match err {
            QueueError::Failed { source, .. } => source,
            other => FetchError::Network(other.to_string()),
        })
    }

    /// Why `name` should be passed over right now, if at all.
    ///
    /// An open breaker whose recovery timer has elapsed does not cause a
    /// skip: that attempt is the half-open probe.
    async fn skip_reason(&self, name: &str) -> Option<SkipReason> {
        let cooled = {
            let mut state = self.state.lock().unwrap();
            match state.cooldowns.get(name) {
                Some(until) if *until > Instant::now() => true,
                Some(_) => {
                    state.cooldowns.remove(name);
                    false
                }
                None => false,
            }
        };
        if cooled {
            return Some(SkipReason::CoolingDown);
        }

        // A marker persisted before a restart still counts.
        let marker_key = keys::rate_limit(name);
        if let Some(expires_ms) = self.store.get::<u64>(&marker_key).await {
            let now = now_ms();
            if expires_ms > now {
                let remaining = Duration::from_millis(expires_ms - now);
                self.state
                    .lock()
                    .unwrap()
                    .cooldowns
                    .insert(name.to_string(), Instant::now() + remaining);
                return Some(SkipReason::CoolingDown);
            }
            self.store.delete(&marker_key).await;
        }

        let status = self.breakers.breaker(name).status().await;
        if status.state == CircuitState::Open
            && !status.manual_override
            && !status.recovery_due(now_ms())
        {
            return Some(SkipReason::BreakerOpen);
        }
        None
    }

    async fn mark_rate_limited(&self, name: &str) {
        let cooldown = self.config.rate_limit_cooldown;
        self.state
            .lock()
            .unwrap()
            .cooldowns
            .insert(name.to_string(), Instant::now() + cooldown);

        info!(orchestrator = %self.config.name, source = %name, cooldown = ?cooldown, "source rate limited, cooling down");
        self.config
            .event_listeners
            .emit(&OrchestratorEvent::SourceRateLimited {
                component: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                source: name.to_string(),
                cooldown,
            });

        let expires_ms = now_ms() + cooldown.as_millis() as u64;
        if let Err(err) = self
            .store
            .set(&keys::rate_limit(name), &expires_ms, cooldown)
            .await
        {
            debug!(source = %name, error = %err, "rate-limit marker not persisted");
        }
    }

    async fn cache_post(&self, key: &str, data: &PostData) {
        if let Err(err) = self.store.set(key, data, self.config.post_ttl).await {
            debug!(orchestrator = %self.config.name, key = %key, error = %err, "post not cached");
        }
    }

    fn emit_cache_hit(&self, key: &str) {
        debug!(orchestrator = %self.config.name, key = %key, "cache hit");
        self.config.event_listeners.emit(&OrchestratorEvent::CacheHit {
            component: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            key: key.to_string(),
        });
    }

    fn emit_skipped(&self, name: &str, reason: SkipReason) {
        debug!(orchestrator = %self.config.name, source = %name, reason = ?reason, "source skipped");
        self.config.event_listeners.emit(&OrchestratorEvent::SourceSkipped {
            component: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            source: name.to_string(),
            reason,
        });
    }
}
