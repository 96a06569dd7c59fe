//! Circuit breaker for unreliable upstream resources.
//!
//! One [`CircuitBreaker`] guards one named resource. Its status lives in the
//! resilient cache (key `circuit_breaker:<name>`), so it survives process
//! restarts and — when the cache is backed by a shared store — is visible to
//! sibling processes.
//!
//! ## States
//! - **Closed**: calls run; consecutive failures are counted and reset on
//!   success. Reaching the failure threshold opens the circuit.
//! - **Open**: calls are denied without touching the network until the
//!   recovery timeout elapses; a supplied fallback provides the answer.
//! - **HalfOpen**: exactly one trial call probes the resource. Success
//!   closes the circuit, failure re-opens it with a fresh timer.
//!
//! A `manual_override` flag disables the short-circuiting entirely while
//! still recording outcomes, for operator-forced recovery testing.
//!
//! ```rust
//! use std::sync::Arc;
//! use fetch_resilience_breaker::{BreakerConfig, BreakerRegistry};
//! use fetch_resilience_cache::{CacheConfig, MemoryBackend, ResilientStore};
//! use fetch_resilience_core::FetchError;
//!
//! # async fn example() {
//! let store = Arc::new(ResilientStore::new(
//!     Arc::new(MemoryBackend::new()),
//!     CacheConfig::builder().build(),
//! ));
//! let registry = BreakerRegistry::new(Arc::clone(&store), BreakerConfig::builder().build());
//!
//! let breaker = registry.breaker("primary-api");
//! let result = breaker
//!     .execute(|| async { Ok::<_, FetchError>("data".to_string()) })
//!     .await;
//! assert_eq!(result.unwrap(), "data");
//! # }
//! ```
//!
//! ## Feature flags
//! - `metrics`: call and transition counters via the `metrics` crate
//!
//! ## Cross-process caveat
//!
//! Status updates against a shared store are read-modify-write, not atomic;
//! concurrent processes can lose failure-count increments. In-process the
//! half-open single-trial invariant is strict, across processes it is
//! approximate. This is accepted, not defended against.

mod breaker;
mod config;
mod error;
mod events;
mod registry;
mod status;

pub use breaker::CircuitBreaker;
pub use config::{BreakerConfig, BreakerConfigBuilder};
pub use error::BreakerError;
pub use events::BreakerEvent;
pub use registry::BreakerRegistry;
pub use status::{BreakerStatus, CircuitState};
