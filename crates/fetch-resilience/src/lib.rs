//! Resilient external-data acquisition for unreliable upstreams.
//!
//! This meta-crate re-exports the four cooperating components; each is also
//! published as a standalone crate for minimal dependency trees:
//!
//! - **Cache** (`cache` feature): TTL key/value store with corruption
//!   detection and an in-process degradation path
//! - **Circuit breaker** (`breaker` feature): per-resource breaker whose
//!   status persists through the cache
//! - **Queue** (`queue` feature): priority queue owning rate limits,
//!   backoff, and retries
//! - **Orchestrator** (`orchestrator` feature): adaptive multi-source fetch
//!   over all of the above
//!
//! Enable everything (the default):
//!
//! ```toml
//! [dependencies]
//! fetch-resilience = "0.1"
//! ```
//!
//! Or pick components:
//!
//! ```toml
//! [dependencies]
//! fetch-resilience = { version = "0.1", default-features = false, features = ["breaker", "queue"] }
//! ```
//!
//! The `metrics` feature turns on `metrics`-crate instrumentation in every
//! enabled component.

// Shared infrastructure is always available.
pub use fetch_resilience_core as core;

#[cfg(feature = "cache")]
pub use fetch_resilience_cache as cache;

#[cfg(feature = "breaker")]
pub use fetch_resilience_breaker as breaker;

#[cfg(feature = "queue")]
pub use fetch_resilience_queue as queue;

#[cfg(feature = "orchestrator")]
pub use fetch_resilience_orchestrator as orchestrator;
