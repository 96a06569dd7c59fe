//! Queue scheduling scenarios with a controlled clock.

use fetch_resilience_core::FetchError;
use fetch_resilience_queue::{QueueConfig, QueueError, RateLimit, RequestQueue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// With a budget of one request per 15-minute window, the first `lookup`
/// executes immediately and the second is delayed until the window resets.
#[tokio::test(start_paused = true)]
async fn second_lookup_in_the_same_window_is_delayed() {
    let queue: RequestQueue<&'static str> = RequestQueue::new(
        QueueConfig::builder()
            .name("lookup-budget")
            .limit("lookup", RateLimit::new(1, Duration::from_millis(900_000)))
            .build(),
    );

    let started = Instant::now();
    let first = queue.enqueue("lookup", 0, 0, || async { Ok("first") });
    let second = queue.enqueue("lookup", 0, 0, || async { Ok("second") });

    assert_eq!(first.await.unwrap(), "first");
    let first_latency = started.elapsed();
    assert!(first_latency < Duration::from_secs(5));

    assert_eq!(second.await.unwrap(), "second");
    assert!(started.elapsed() >= Duration::from_millis(899_000));
}

/// Requests across different operations do not share a budget.
#[tokio::test(start_paused = true)]
async fn budgets_are_per_operation() {
    let queue: RequestQueue<u32> = RequestQueue::new(
        QueueConfig::builder()
            .limit("lookup", RateLimit::new(1, Duration::from_secs(900)))
            .build(),
    );

    let started = Instant::now();
    let lookup = queue.enqueue("lookup", 0, 0, || async { Ok(1) });
    let profile = queue.enqueue("profile", 0, 0, || async { Ok(2) });

    assert_eq!(lookup.await.unwrap(), 1);
    assert_eq!(profile.await.unwrap(), 2);
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// The queue drains by priority, FIFO within a priority level, even when
/// everything is submitted at once.
#[tokio::test(start_paused = true)]
async fn drains_by_priority_then_enqueue_order() {
    let queue: RequestQueue<()> = RequestQueue::new(QueueConfig::builder().build());
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for (label, priority) in [
        ("background", 0),
        ("interactive-a", 10),
        ("normal", 5),
        ("interactive-b", 10),
    ] {
        let order = Arc::clone(&order);
        handles.push(queue.enqueue("op", priority, 0, move || {
            let order = Arc::clone(&order);
            async move {
                order.lock().unwrap().push(label);
                Ok(())
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        *order.lock().unwrap(),
        vec!["interactive-a", "interactive-b", "normal", "background"]
    );
}

/// Transient failures retry with backoff until the bound, then reject with
/// the final error.
#[tokio::test(start_paused = true)]
async fn transient_failures_retry_then_give_up() {
    let queue: RequestQueue<()> = RequestQueue::new(QueueConfig::builder().build());

    let attempts = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&attempts);
    let handle = queue.enqueue("op", 0, 2, move || {
        a.fetch_add(1, Ordering::SeqCst);
        async { Err(FetchError::Upstream { status: 503 }) }
    });

    let err = handle.await.unwrap_err();
    assert_eq!(
        err,
        QueueError::Failed {
            attempts: 3,
            source: FetchError::Upstream { status: 503 },
        }
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

/// `clear` rejects everything still queued; work submitted afterwards runs
/// normally.
#[tokio::test(start_paused = true)]
async fn clear_is_an_emergency_flush_not_a_shutdown() {
    let queue: RequestQueue<u32> = RequestQueue::new(QueueConfig::builder().build());

    let doomed = queue.enqueue("op", 0, 0, || async { Ok(1) });
    assert_eq!(queue.clear(), 1);
    assert_eq!(doomed.await.unwrap_err(), QueueError::Cleared);

    let survivor = queue.enqueue("op", 0, 0, || async { Ok(2) });
    assert_eq!(survivor.await.unwrap(), 2);
}
