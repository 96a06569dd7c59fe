//! The queue itself and its scheduler task.

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::events::QueueEvent;
use crate::window::RateWindow;
use fetch_resilience_core::FetchError;
use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::{oneshot, Notify};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

type JobFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync>;

struct QueuedRequest<T> {
    seq: u64,
    operation: String,
    priority: i32,
    retry_count: u32,
    max_retries: u32,
    execute: JobFn<T>,
    done: oneshot::Sender<Result<T, QueueError>>,
}

impl<T> PartialEq for QueuedRequest<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for QueuedRequest<T> {}

impl<T> PartialOrd for QueuedRequest<T> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueuedRequest<T> {
    // Max-heap order: higher priority first, earlier sequence number breaking
    // ties. Retries keep their original sequence number.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.priority
            .cmp(&other.priority)
            .then(other.seq.cmp(&self.seq))
    }
}

struct QueueState<T> {
    heap: BinaryHeap<QueuedRequest<T>>,
    windows: HashMap<String, RateWindow>,
}

struct QueueInner<T> {
    config: QueueConfig,
    state: Mutex<QueueState<T>>,
    notify: Notify,
    next_seq: AtomicU64,
    closed: AtomicBool,
}

impl<T> QueueInner<T> {
    fn emit(&self, event: &QueueEvent) {
        self.config.event_listeners.emit(event);
    }
}

/// Awaitable handle for an enqueued request.
pub struct QueueHandle<T> {
    rx: oneshot::Receiver<Result<T, QueueError>>,
}

impl<T> Future for QueueHandle<T> {
    type Output = Result<T, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(QueueError::Shutdown)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Priority queue that owns all rate limiting and retry policy.
///
/// Cloning is cheap and shares the queue. The scheduler task is spawned on
/// construction, so a queue must be created inside a Tokio runtime.
pub struct RequestQueue<T> {
    inner: Arc<QueueInner<T>>,
}

impl<T> Clone for RequestQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> RequestQueue<T> {
    /// Creates the queue and spawns its scheduler.
    pub fn new(config: QueueConfig) -> Self {
        let inner = Arc::new(QueueInner {
            config,
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                windows: HashMap::new(),
            }),
            notify: Notify::new(),
            next_seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        });
        tokio::spawn(run_scheduler(Arc::clone(&inner)));
        Self { inner }
    }

    /// Submits work and returns an awaitable handle.
    ///
    /// `operation` selects the rate-limit budget; higher `priority` drains
    /// first; `max_retries` bounds backoff retries of retryable failures.
    /// The closure is called once per attempt.
    pub fn enqueue<N, F, Fut>(
        &self,
        operation: N,
        priority: i32,
        max_retries: u32,
        execute: F,
    ) -> QueueHandle<T>
    where
        N: Into<String>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let operation = operation.into();
        let (tx, rx) = oneshot::channel();

        if self.inner.closed.load(Ordering::Acquire) {
            let _ = tx.send(Err(QueueError::Shutdown));
            return QueueHandle { rx };
        }

        let request = QueuedRequest {
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
            operation: operation.clone(),
            priority,
            retry_count: 0,
            max_retries,
            execute: Arc::new(move || Box::pin(execute()) as BoxFuture<'static, _>),
            done: tx,
        };

        let depth = {
            let mut state = self.inner.state.lock().unwrap();
            state.heap.push(request);
            state.heap.len()
        };
        #[cfg(feature = "metrics")]
        gauge!("queue_depth", "queue" => self.inner.config.name.clone()).set(depth as f64);

        self.inner.emit(&QueueEvent::Enqueued {
            component: self.inner.config.name.clone(),
            timestamp: std::time::Instant::now(),
            operation,
            priority,
            depth,
        });
        self.inner.notify.notify_one();
        QueueHandle { rx }
    }

    /// Number of requests waiting to run.
    pub fn depth(&self) -> usize {
        self.inner.state.lock().unwrap().heap.len()
    }

    /// Rejects every pending request with [`QueueError::Cleared`].
    ///
    /// In-flight work is not interrupted. Returns how many requests were
    /// rejected.
    pub fn clear(&self) -> usize {
        let drained: Vec<QueuedRequest<T>> = {
            let mut state = self.inner.state.lock().unwrap();
            state.heap.drain().collect()
        };
        let rejected = drained.len();
        for request in drained {
            let _ = request.done.send(Err(QueueError::Cleared));
        }
        if rejected > 0 {
            warn!(queue = %self.inner.config.name, rejected, "queue cleared");
        }
        self.inner.emit(&QueueEvent::Cleared {
            component: self.inner.config.name.clone(),
            timestamp: std::time::Instant::now(),
            rejected,
        });
        rejected
    }

    /// Clears pending work and stops the scheduler.
    pub fn shutdown(&self) -> usize {
        self.inner.closed.store(true, Ordering::Release);
        let rejected = self.clear();
        self.inner.notify.notify_one();
        rejected
    }
}

async fn run_scheduler<T: Send + 'static>(inner: Arc<QueueInner<T>>) {
    loop {
        if inner.closed.load(Ordering::Acquire) {
            break;
        }

        let next = { inner.state.lock().unwrap().heap.pop() };
        let Some(request) = next else {
            // Idle: wait for an enqueue kick or the periodic tick.
            tokio::select! {
                _ = inner.notify.notified() => {}
                _ = sleep(inner.config.tick_interval) => {}
            }
            continue;
        };

        let wait = {
            let mut state = inner.state.lock().unwrap();
            let limit = inner.config.limit_for(&request.operation);
            let now = Instant::now();
            state
                .windows
                .entry(request.operation.clone())
                .or_insert_with(|| RateWindow::new(limit, now))
                .time_until_ready(now)
        };

        if let Some(wait) = wait {
            let capped = wait.min(inner.config.max_window_wait);
            debug!(
                queue = %inner.config.name,
                operation = %request.operation,
                wait = ?capped,
                "budget exhausted, waiting for window reset"
            );
            inner.emit(&QueueEvent::RateLimited {
                component: inner.config.name.clone(),
                timestamp: std::time::Instant::now(),
                operation: request.operation.clone(),
                wait: capped,
            });
            // Back to the front: the sequence number is unchanged.
            inner.state.lock().unwrap().heap.push(request);
            sleep(capped).await;
            continue;
        }

        let result = (request.execute)().await;
        match result {
            Ok(value) => {
                {
                    let mut state = inner.state.lock().unwrap();
                    if let Some(window) = state.windows.get_mut(&request.operation) {
                        window.record(Instant::now());
                    }
                }
                inner.emit(&QueueEvent::Completed {
                    component: inner.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    operation: request.operation.clone(),
                    attempts: request.retry_count + 1,
                });
                #[cfg(feature = "metrics")]
                counter!("queue_requests_total", "queue" => inner.config.name.clone(), "outcome" => "success").increment(1);

                let _ = request.done.send(Ok(value));
                sleep(inner.config.politeness_delay).await;
            }
            Err(err) if err.is_retryable() && request.retry_count < request.max_retries => {
                let delay = inner.config.backoff.delay_for(request.retry_count);
                debug!(
                    queue = %inner.config.name,
                    operation = %request.operation,
                    attempt = request.retry_count + 1,
                    delay = ?delay,
                    error = %err,
                    "retryable failure, backing off"
                );
                inner.emit(&QueueEvent::RetryScheduled {
                    component: inner.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    operation: request.operation.clone(),
                    attempt: request.retry_count + 1,
                    delay,
                });

                let mut request = request;
                request.retry_count += 1;
                let inner = Arc::clone(&inner);
                tokio::spawn(async move {
                    sleep(delay).await;
                    if inner.closed.load(Ordering::Acquire) {
                        let _ = request.done.send(Err(QueueError::Shutdown));
                        return;
                    }
                    inner.state.lock().unwrap().heap.push(request);
                    inner.notify.notify_one();
                });
            }
            Err(err) => {
                inner.emit(&QueueEvent::RequestFailed {
                    component: inner.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    operation: request.operation.clone(),
                    attempts: request.retry_count + 1,
                });
                #[cfg(feature = "metrics")]
                counter!("queue_requests_total", "queue" => inner.config.name.clone(), "outcome" => "failure").increment(1);

                let _ = request.done.send(Err(QueueError::Failed {
                    attempts: request.retry_count + 1,
                    source: err,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::RateLimit;
    use crate::QueueConfig;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn config() -> crate::QueueConfigBuilder {
        QueueConfig::builder().name("test")
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_in_priority_order_with_fifo_ties() {
        let queue: RequestQueue<&'static str> = RequestQueue::new(config().build());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (label, priority) in [("low", 1), ("high-a", 9), ("mid", 5), ("high-b", 9)] {
            let order = Arc::clone(&order);
            handles.push(queue.enqueue("op", priority, 0, move || {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push(label);
                    Ok(label)
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(
            *order.lock().unwrap(),
            vec!["high-a", "high-b", "mid", "low"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_request_waits_for_the_window_reset() {
        let queue: RequestQueue<u32> = RequestQueue::new(
            config()
                .limit("lookup", RateLimit::new(1, Duration::from_secs(900)))
                .build(),
        );

        let started = Instant::now();
        let first = queue.enqueue("lookup", 0, 0, || async { Ok(1) });
        let second = queue.enqueue("lookup", 0, 0, || async { Ok(2) });

        assert_eq!(first.await.unwrap(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));

        assert_eq!(second.await.unwrap(), 2);
        // Delayed until the 900 s window rolled over.
        assert!(started.elapsed() >= Duration::from_secs(899));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_failures_with_backoff() {
        let retries = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&retries);
        let queue: RequestQueue<&'static str> = RequestQueue::new(
            config()
                .on_retry(move |_, _| {
                    r.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        );

        let attempts = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&attempts);
        let handle = queue.enqueue("op", 0, 3, move || {
            let a = Arc::clone(&a);
            async move {
                if a.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::Upstream { status: 503 })
                } else {
                    Ok("recovered")
                }
            }
        });

        assert_eq!(handle.await.unwrap(), "recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(retries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let queue: RequestQueue<()> = RequestQueue::new(config().build());

        let attempts = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&attempts);
        let handle = queue.enqueue("op", 0, 3, move || {
            a.fetch_add(1, Ordering::SeqCst);
            async { Err(FetchError::Auth { status: 401 }) }
        });

        let err = handle.await.unwrap_err();
        assert_eq!(
            err,
            QueueError::Failed {
                attempts: 1,
                source: FetchError::Auth { status: 401 },
            }
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_reject_with_the_final_error() {
        let queue: RequestQueue<()> = RequestQueue::new(config().build());

        let handle = queue.enqueue("op", 0, 2, || async {
            Err(FetchError::Timeout(Duration::from_secs(10)))
        });

        let err = handle.await.unwrap_err();
        assert_eq!(
            err,
            QueueError::Failed {
                attempts: 3,
                source: FetchError::Timeout(Duration::from_secs(10)),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clear_rejects_all_pending_requests() {
        let cleared = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&cleared);
        let queue: RequestQueue<u32> = RequestQueue::new(
            config()
                .on_cleared(move |n| {
                    c.fetch_add(n, Ordering::SeqCst);
                })
                .build(),
        );

        let first = queue.enqueue("op", 0, 0, || async { Ok(1) });
        let second = queue.enqueue("op", 0, 0, || async { Ok(2) });
        assert_eq!(queue.depth(), 2);

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.depth(), 0);
        assert_eq!(first.await.unwrap_err(), QueueError::Cleared);
        assert_eq!(second.await.unwrap_err(), QueueError::Cleared);
        assert_eq!(cleared.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_after_shutdown_is_rejected() {
        let queue: RequestQueue<u32> = RequestQueue::new(config().build());
        queue.shutdown();

        let handle = queue.enqueue("op", 0, 0, || async { Ok(1) });
        assert_eq!(handle.await.unwrap_err(), QueueError::Shutdown);
    }
}
