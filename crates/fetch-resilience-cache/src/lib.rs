//! Resilient key/value cache for the acquisition layer.
//!
//! [`ResilientStore`] wraps a pluggable [`CacheBackend`] (an external KV
//! store in production, [`MemoryBackend`] in tests and single-node setups)
//! and keeps the caller available whatever the backend does:
//!
//! - Values are serialized through a single `serde_json` path and checked
//!   against known corruption sentinels on both write and read. A corrupt
//!   entry is deleted and reported as a miss, never surfaced.
//! - When the backend becomes unreachable the store flips into degraded mode
//!   and serves a bounded in-process fallback map until an explicit
//!   [`ResilientStore::probe`] succeeds.
//! - No cache operation is ever fatal to the caller.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use fetch_resilience_cache::{CacheConfig, MemoryBackend, ResilientStore};
//!
//! # async fn example() {
//! let store = ResilientStore::new(
//!     Arc::new(MemoryBackend::new()),
//!     CacheConfig::builder().name("posts").build(),
//! );
//!
//! store.set("post:1", &"hello".to_string(), Duration::from_secs(300)).await.ok();
//! let cached: Option<String> = store.get("post:1").await;
//! assert_eq!(cached.as_deref(), Some("hello"));
//! # }
//! ```
//!
//! ## Feature flags
//! - `metrics`: hit/miss/corruption counters via the `metrics` crate

mod backend;
mod config;
mod error;
mod events;
mod sentinel;
mod store;

pub use backend::{BackendError, CacheBackend, MemoryBackend};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::CacheError;
pub use events::CacheEvent;
pub use store::ResilientStore;
