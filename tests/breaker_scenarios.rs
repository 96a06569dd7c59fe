//! Cross-crate breaker scenarios over a real cache store.

use fetch_resilience_breaker::{
    BreakerConfig, BreakerError, BreakerRegistry, CircuitState,
};
use fetch_resilience_cache::{CacheConfig, MemoryBackend, ResilientStore};
use fetch_resilience_core::FetchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn store() -> Arc<ResilientStore> {
    Arc::new(ResilientStore::new(
        Arc::new(MemoryBackend::new()),
        CacheConfig::builder().name("breaker-it").build(),
    ))
}

/// Three consecutive failures open the breaker; the fourth call (before the
/// recovery timeout) returns the fallback without invoking the operation.
#[tokio::test]
async fn three_failures_open_and_the_fourth_call_uses_the_fallback() {
    let registry = BreakerRegistry::new(
        store(),
        BreakerConfig::builder()
            .failure_threshold(3)
            .recovery_timeout(Duration::from_secs(300))
            .build(),
    );
    let breaker = registry.breaker("flaky-upstream");

    let invocations = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let i = Arc::clone(&invocations);
        let result = breaker
            .execute(move || {
                i.fetch_add(1, Ordering::SeqCst);
                async { Err::<&str, _>(FetchError::Upstream { status: 500 }) }
            })
            .await;
        assert!(matches!(result, Err(BreakerError::Inner(_))));
    }
    assert_eq!(breaker.state().await, CircuitState::Open);
    assert_eq!(invocations.load(Ordering::SeqCst), 3);

    let i = Arc::clone(&invocations);
    let result = breaker
        .execute_with_fallback(
            move || {
                i.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, FetchError>("live") }
            },
            || async { Ok::<_, FetchError>("degraded") },
        )
        .await
        .unwrap();

    assert_eq!(result, "degraded");
    // The protected operation was never reached.
    assert_eq!(invocations.load(Ordering::SeqCst), 3);
}

/// Once the recovery timeout elapses, the next call goes through half-open,
/// never straight back to closed.
#[tokio::test]
async fn recovery_passes_through_half_open() {
    let registry = BreakerRegistry::new(
        store(),
        BreakerConfig::builder()
            .failure_threshold(1)
            .recovery_timeout(Duration::from_millis(50))
            .build(),
    );
    let breaker = registry.breaker("upstream");

    let _ = breaker
        .execute(|| async { Err::<(), _>(FetchError::Upstream { status: 503 }) })
        .await;
    assert_eq!(breaker.state().await, CircuitState::Open);

    // Before the timeout the breaker stays open and keeps denying.
    let early = breaker.execute(|| async { Ok::<_, FetchError>(()) }).await;
    assert!(matches!(early, Err(BreakerError::Open { .. })));
    assert_eq!(breaker.state().await, CircuitState::Open);

    sleep(Duration::from_millis(70)).await;

    // The state observed by the trial itself is HalfOpen.
    let seen = Arc::new(std::sync::Mutex::new(None));
    let s = Arc::clone(&seen);
    let b = Arc::clone(&breaker);
    breaker
        .execute(move || {
            let s = Arc::clone(&s);
            let b = Arc::clone(&b);
            async move {
                *s.lock().unwrap() = Some(b.state().await);
                Ok::<_, FetchError>(())
            }
        })
        .await
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(CircuitState::HalfOpen));
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

/// While a half-open trial is in flight, a concurrent caller does not start
/// a second trial.
#[tokio::test]
async fn concurrent_half_open_callers_get_a_single_trial() {
    let registry = BreakerRegistry::new(
        store(),
        BreakerConfig::builder()
            .failure_threshold(1)
            .recovery_timeout(Duration::from_millis(40))
            .build(),
    );
    let breaker = registry.breaker("upstream");

    let _ = breaker
        .execute(|| async { Err::<(), _>(FetchError::Upstream { status: 500 }) })
        .await;
    sleep(Duration::from_millis(60)).await;

    let trial_invocations = Arc::new(AtomicUsize::new(0));
    let i = Arc::clone(&trial_invocations);
    let slow_trial = {
        let breaker = registry.breaker("upstream");
        tokio::spawn(async move {
            breaker
                .execute(move || {
                    i.fetch_add(1, Ordering::SeqCst);
                    async {
                        sleep(Duration::from_millis(120)).await;
                        Ok::<_, FetchError>("probed")
                    }
                })
                .await
        })
    };

    sleep(Duration::from_millis(30)).await;

    let competing = Arc::new(AtomicUsize::new(0));
    let i = Arc::clone(&competing);
    let denied = breaker
        .execute(move || {
            i.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FetchError>("second trial") }
        })
        .await;

    assert!(matches!(denied, Err(BreakerError::Open { .. })));
    assert_eq!(competing.load(Ordering::SeqCst), 0);

    assert_eq!(slow_trial.await.unwrap().unwrap(), "probed");
    assert_eq!(trial_invocations.load(Ordering::SeqCst), 1);
    assert_eq!(breaker.state().await, CircuitState::Closed);
}

/// Breaker status lives in the cache store, so a registry built later (as
/// after a restart) observes the open circuit.
#[tokio::test]
async fn status_is_shared_through_the_store() {
    let store = store();
    {
        let registry = BreakerRegistry::new(
            Arc::clone(&store),
            BreakerConfig::builder().failure_threshold(1).build(),
        );
        let _ = registry
            .breaker("primary-api")
            .execute(|| async { Err::<(), _>(FetchError::Upstream { status: 500 }) })
            .await;
    }

    let revived = BreakerRegistry::new(store, BreakerConfig::builder().build());
    let status = revived.breaker("primary-api").status().await;
    assert_eq!(status.state, CircuitState::Open);
    assert_eq!(status.failure_count, 1);
}
