//! Adaptive multi-source fetch orchestration.
//!
//! The [`Orchestrator`] is the entry point of the acquisition layer. It
//! holds an ordered list of [`PostSource`] adapters (the out-of-scope
//! scraping/API implementations), wraps each behind its own circuit breaker,
//! schedules every call through the rate-limited queue, and caches results
//! through the resilient store:
//!
//! - Reads consult the cache first; every successful fetch is written back
//!   tagged with the source that produced it.
//! - A source is skipped while its breaker is open or while a rate-limit
//!   cooldown (started by a quota error such as HTTP 429) is active; once
//!   the cooldown lapses the source is probed again automatically.
//! - When every source fails, the caller receives one aggregate
//!   [`OrchestratorError::Exhausted`] — never a raw adapter error.
//!
//! [`Orchestrator::health`] exposes a side-effect-free snapshot of the whole
//! layer: preferred source, per-source breaker state and rolling statistics,
//! queue depth.
//!
//! Components are handed in explicitly; nothing here is a process-wide
//! static:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fetch_resilience_breaker::{BreakerConfig, BreakerRegistry};
//! use fetch_resilience_cache::{CacheConfig, MemoryBackend, ResilientStore};
//! use fetch_resilience_orchestrator::{Orchestrator, OrchestratorConfig, PostRequest};
//! use fetch_resilience_queue::{QueueConfig, RequestQueue};
//!
//! # async fn example(sources: Vec<Arc<dyn fetch_resilience_orchestrator::PostSource>>) {
//! let store = Arc::new(ResilientStore::new(
//!     Arc::new(MemoryBackend::new()),
//!     CacheConfig::builder().name("acquisition").build(),
//! ));
//! let breakers = Arc::new(BreakerRegistry::new(
//!     Arc::clone(&store),
//!     BreakerConfig::builder().build(),
//! ));
//! let queue = RequestQueue::new(QueueConfig::builder().name("acquisition").build());
//!
//! let orchestrator = Orchestrator::new(
//!     sources,
//!     store,
//!     breakers,
//!     queue,
//!     OrchestratorConfig::builder().build(),
//! );
//!
//! let post = orchestrator
//!     .fetch(&PostRequest::new("https://x.com/someone/status/1234567890"))
//!     .await;
//! # let _ = post;
//! # }
//! ```
//!
//! ## Feature flags
//! - `metrics`: per-source attempt counters via the `metrics` crate

mod config;
mod error;
mod events;
mod health;
mod model;
mod orchestrator;
mod source;
mod stats;

pub use config::{OrchestratorConfig, OrchestratorConfigBuilder};
pub use error::{OrchestratorError, SourceFailure};
pub use events::{OrchestratorEvent, SkipReason};
pub use health::{HealthSnapshot, SourceHealth};
pub use model::{Author, Engagement, EngagementSnapshot, PostData, PostRequest};
pub use orchestrator::Orchestrator;
pub use source::PostSource;
pub use stats::AttemptRecord;
