//! Rate-limited priority queue for upstream calls.
//!
//! [`RequestQueue`] is the single place where retry, backoff, and request
//! budgeting happen; call sites only submit work and await the result.
//!
//! - Ready requests drain strictly by `(priority desc, enqueue order asc)`.
//! - Each operation name has a fixed request budget per time window; an
//!   exhausted window keeps the request at the front while the scheduler
//!   sleeps until the reset (capped so it can never block unboundedly).
//! - Retryable failures (see [`FetchError::is_retryable`]) are re-enqueued
//!   after an exponential backoff with jitter; permanent failures and
//!   exhausted retries reject the caller's handle with the underlying error.
//! - [`RequestQueue::clear`] rejects everything still pending, for shutdown
//!   or emergency flushes. In-flight work is never interrupted.
//!
//! ```rust
//! use fetch_resilience_core::FetchError;
//! use fetch_resilience_queue::{QueueConfig, RequestQueue};
//!
//! # async fn example() {
//! let queue: RequestQueue<String> = RequestQueue::new(QueueConfig::builder().build());
//!
//! let handle = queue.enqueue("lookup", 5, 2, || async {
//!     Ok::<_, FetchError>("post data".to_string())
//! });
//! let data = handle.await.unwrap();
//! # let _ = data;
//! # }
//! ```
//!
//! ## Feature flags
//! - `metrics`: queue depth gauge and completion counters

mod backoff;
mod config;
mod error;
mod events;
mod queue;
mod window;

pub use backoff::ExponentialBackoff;
pub use config::{QueueConfig, QueueConfigBuilder};
pub use error::QueueError;
pub use events::QueueEvent;
pub use queue::{QueueHandle, RequestQueue};
pub use window::RateLimit;

// Re-exported for closures written against the queue.
pub use fetch_resilience_core::FetchError;
