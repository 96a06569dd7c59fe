//! The per-resource breaker state machine.

use crate::config::BreakerConfig;
use crate::error::BreakerError;
use crate::events::BreakerEvent;
use crate::status::{now_ms, BreakerStatus, CircuitState};
use fetch_resilience_cache::ResilientStore;
use fetch_resilience_core::{keys, FetchError};
#[cfg(feature = "metrics")]
use metrics::counter;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

/// Outcome of asking the state machine whether a call may run.
enum Admission {
    /// State machine allows the call (closed, or manual override).
    Proceed,
    /// The call is the half-open trial; the permit is held for its duration.
    Trial(#[allow(dead_code)] OwnedSemaphorePermit),
}

impl Admission {
    fn is_trial(&self) -> bool {
        matches!(self, Admission::Trial(_))
    }
}

struct Denial {
    retry_in: Option<Duration>,
}

/// Circuit breaker for one named resource.
///
/// Construct through a [`BreakerRegistry`](crate::BreakerRegistry) so that
/// every caller naming the same resource shares the same trial gate.
pub struct CircuitBreaker {
    name: String,
    key: String,
    config: BreakerConfig,
    store: Arc<ResilientStore>,
    trial_permits: Arc<Semaphore>,
}

impl CircuitBreaker {
    /// Creates a breaker for `name`, persisting status through `store`.
    pub fn new(name: &str, store: Arc<ResilientStore>, config: BreakerConfig) -> Self {
        let trial_permits = Arc::new(Semaphore::new(config.half_open_max_calls));
        Self {
            name: name.to_string(),
            key: keys::circuit_breaker(name),
            config,
            store,
            trial_permits,
        }
    }

    /// Name of the protected resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `operation` under the breaker.
    ///
    /// A denied call returns [`BreakerError::Open`] without invoking the
    /// operation; an admitted call's failure is recorded and returned as
    /// [`BreakerError::Inner`].
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        match self.admit().await {
            Ok(admission) => {
                let result = operation().await;
                self.record(result.is_ok(), admission.is_trial()).await;
                result.map_err(BreakerError::Inner)
            }
            Err(denial) => Err(BreakerError::Open {
                resource: self.name.clone(),
                retry_in: denial.retry_in,
            }),
        }
    }

    /// Runs `operation` under the breaker, answering from `fallback` both
    /// when the circuit denies the call and when the operation fails.
    pub async fn execute_with_fallback<T, F, Fut, FB, FbFut>(
        &self,
        operation: F,
        fallback: FB,
    ) -> Result<T, BreakerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        FB: FnOnce() -> FbFut,
        FbFut: Future<Output = Result<T, FetchError>>,
    {
        match self.admit().await {
            Ok(admission) => {
                let result = operation().await;
                self.record(result.is_ok(), admission.is_trial()).await;
                match result {
                    Ok(value) => Ok(value),
                    Err(err) => {
                        debug!(breaker = %self.name, error = %err, "operation failed, answering from fallback");
                        fallback().await.map_err(BreakerError::Inner)
                    }
                }
            }
            Err(_) => {
                debug!(breaker = %self.name, "circuit denied call, answering from fallback");
                fallback().await.map_err(BreakerError::Inner)
            }
        }
    }

    /// Current persisted status. Side-effect free.
    pub async fn status(&self) -> BreakerStatus {
        self.load().await
    }

    /// Current state. Side-effect free.
    pub async fn state(&self) -> CircuitState {
        self.load().await.state
    }

    /// Forces the circuit open.
    pub async fn force_open(&self) {
        let mut status = self.load().await;
        self.transition(&mut status, CircuitState::Open);
        self.persist(&status).await;
    }

    /// Forces the circuit closed and clears the failure count.
    pub async fn force_closed(&self) {
        let mut status = self.load().await;
        self.transition(&mut status, CircuitState::Closed);
        self.persist(&status).await;
    }

    /// Enables or disables the manual override.
    ///
    /// While set, calls always run; outcomes are still recorded.
    pub async fn set_manual_override(&self, enabled: bool) {
        let mut status = self.load().await;
        status.manual_override = enabled;
        info!(breaker = %self.name, enabled, "manual override changed");
        self.persist(&status).await;
    }

    async fn admit(&self) -> Result<Admission, Denial> {
        let mut status = self.load().await;

        if status.manual_override {
            self.emit_permitted(status.state);
            return Ok(Admission::Proceed);
        }

        match status.state {
            CircuitState::Closed => {
                self.emit_permitted(CircuitState::Closed);
                Ok(Admission::Proceed)
            }
            CircuitState::Open => {
                let now = now_ms();
                if status.recovery_due(now) {
                    self.transition(&mut status, CircuitState::HalfOpen);
                    self.persist(&status).await;
                    self.try_trial()
                } else {
                    self.emit_rejected();
                    let retry_in = status
                        .next_attempt_at_ms
                        .map(|at| Duration::from_millis(at.saturating_sub(now)));
                    Err(Denial { retry_in })
                }
            }
            CircuitState::HalfOpen => self.try_trial(),
        }
    }

    fn try_trial(&self) -> Result<Admission, Denial> {
        match Arc::clone(&self.trial_permits).try_acquire_owned() {
            Ok(permit) => {
                self.emit_permitted(CircuitState::HalfOpen);
                Ok(Admission::Trial(permit))
            }
            Err(_) => {
                // A trial is already probing the resource.
                self.emit_rejected();
                Err(Denial { retry_in: None })
            }
        }
    }

    async fn record(&self, success: bool, was_trial: bool) {
        let mut status = self.load().await;
        let before = status.clone();

        if success {
            self.config.event_listeners.emit(&BreakerEvent::SuccessRecorded {
                component: self.name.clone(),
                timestamp: Instant::now(),
                state: status.state,
            });
            #[cfg(feature = "metrics")]
            counter!("breaker_calls_total", "breaker" => self.name.clone(), "outcome" => "success")
                .increment(1);

            status.failure_count = 0;
            if was_trial && status.state == CircuitState::HalfOpen {
                self.transition(&mut status, CircuitState::Closed);
            }
        } else {
            self.config.event_listeners.emit(&BreakerEvent::FailureRecorded {
                component: self.name.clone(),
                timestamp: Instant::now(),
                state: status.state,
            });
            #[cfg(feature = "metrics")]
            counter!("breaker_calls_total", "breaker" => self.name.clone(), "outcome" => "failure")
                .increment(1);

            status.failure_count += 1;
            status.last_failure_at_ms = Some(now_ms());
            if was_trial && status.state == CircuitState::HalfOpen {
                self.transition(&mut status, CircuitState::Open);
            } else if status.state == CircuitState::Closed
                && status.failure_count >= self.config.failure_threshold
            {
                self.transition(&mut status, CircuitState::Open);
            }
        }

        if status != before {
            self.persist(&status).await;
        }
    }

    fn transition(&self, status: &mut BreakerStatus, to: CircuitState) {
        if status.state == to {
            return;
        }
        let from = status.state;

        self.config.event_listeners.emit(&BreakerEvent::StateTransition {
            component: self.name.clone(),
            timestamp: Instant::now(),
            from,
            to,
        });
        info!(breaker = %self.name, from = ?from, to = ?to, "circuit state transition");
        #[cfg(feature = "metrics")]
        counter!("breaker_transitions_total", "breaker" => self.name.clone()).increment(1);

        status.state = to;
        match to {
            CircuitState::Open => {
                status.next_attempt_at_ms =
                    Some(now_ms() + self.config.recovery_timeout.as_millis() as u64);
            }
            CircuitState::Closed => {
                status.failure_count = 0;
                status.next_attempt_at_ms = None;
            }
            CircuitState::HalfOpen => {}
        }
    }

    async fn load(&self) -> BreakerStatus {
        self.store
            .get::<BreakerStatus>(&self.key)
            .await
            .unwrap_or_else(|| BreakerStatus::new(&self.name))
    }

    async fn persist(&self, status: &BreakerStatus) {
        if let Err(err) = self
            .store
            .set(&self.key, status, self.config.status_ttl)
            .await
        {
            warn!(breaker = %self.name, error = %err, "failed to persist breaker status");
        }
    }

    fn emit_permitted(&self, state: CircuitState) {
        self.config.event_listeners.emit(&BreakerEvent::CallPermitted {
            component: self.name.clone(),
            timestamp: Instant::now(),
            state,
        });
    }

    fn emit_rejected(&self) {
        self.config.event_listeners.emit(&BreakerEvent::CallRejected {
            component: self.name.clone(),
            timestamp: Instant::now(),
        });
        #[cfg(feature = "metrics")]
        counter!("breaker_calls_total", "breaker" => self.name.clone(), "outcome" => "rejected")
            .increment(1);
    }
}
