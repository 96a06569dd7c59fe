//! The resilient store: backend reads/writes, sentinel checks, degraded mode.

use crate::backend::{BackendError, CacheBackend};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::events::CacheEvent;
use crate::sentinel;
#[cfg(feature = "metrics")]
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

struct FallbackEntry {
    raw: String,
    expires_at: Instant,
}

/// Bounded in-process map used while the backend is unreachable.
///
/// Eviction removes the entry closest to (or past) its expiry, so the data
/// that would be lost soonest anyway goes first.
struct FallbackMap {
    entries: HashMap<String, FallbackEntry>,
    capacity: usize,
}

impl FallbackMap {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.raw.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert(&mut self, key: &str, raw: String, ttl: Duration) {
        if !self.entries.contains_key(key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.expires_at)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&oldest);
            }
        }
        self.entries.insert(
            key.to_string(),
            FallbackEntry {
                raw,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Key/value store with TTL, corruption detection, and a bounded in-process
/// degradation path.
///
/// See the crate docs for the full contract. The store is cheap to share
/// behind an `Arc`; all methods take `&self`.
pub struct ResilientStore {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
    degraded: AtomicBool,
    fallback: Mutex<FallbackMap>,
}

impl ResilientStore {
    /// Creates a store over the given backend.
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        let fallback = Mutex::new(FallbackMap::new(config.fallback_capacity));
        Self {
            backend,
            config,
            degraded: AtomicBool::new(false),
            fallback,
        }
    }

    /// Whether the store is currently serving from the fallback map.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Number of entries currently held in the fallback map.
    pub fn fallback_len(&self) -> usize {
        self.fallback.lock().unwrap().len()
    }

    /// Looks up and deserializes a value.
    ///
    /// Returns `None` on a missing, expired, or corrupt entry; corrupt
    /// entries are deleted before returning. Backend failures switch the
    /// store to the fallback map, never surface.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = if self.is_degraded() {
            self.fallback.lock().unwrap().get(key)
        } else {
            match self.backend.get(key).await {
                Ok(raw) => raw,
                Err(err) => {
                    self.enter_degraded(&err);
                    self.fallback.lock().unwrap().get(key)
                }
            }
        };

        let Some(raw) = raw else {
            #[cfg(feature = "metrics")]
            counter!("cache_misses_total", "cache" => self.config.name.clone()).increment(1);
            return None;
        };

        if sentinel::is_corrupt(&raw) {
            self.report_corruption(key);
            self.delete(key).await;
            return None;
        }

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                #[cfg(feature = "metrics")]
                counter!("cache_hits_total", "cache" => self.config.name.clone()).increment(1);
                Some(value)
            }
            Err(err) => {
                // Undecodable for the requested type is the same corruption
                // class as a sentinel match: drop it and miss.
                debug!(cache = %self.config.name, key, error = %err, "cached value failed to decode");
                self.report_corruption(key);
                self.delete(key).await;
                None
            }
        }
    }

    /// Serializes and stores a value with the given TTL.
    ///
    /// Fails only when the payload cannot be cached at all (unserializable,
    /// or its serialized form matches a corruption sentinel). A backend
    /// write failure is retried once against the fallback map and reported
    /// as success.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value).map_err(|err| CacheError::Serialize {
            key: key.to_string(),
            reason: err.to_string(),
        })?;

        if sentinel::is_corrupt(&raw) {
            warn!(cache = %self.config.name, key, "refusing to cache sentinel-shaped payload");
            self.config.event_listeners.emit(&CacheEvent::WriteRejected {
                component: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                key: key.to_string(),
            });
            return Err(CacheError::RejectedSentinel {
                key: key.to_string(),
            });
        }

        if !self.is_degraded() {
            match self.backend.set(key, raw.clone(), ttl).await {
                Ok(()) => return Ok(()),
                Err(err) => self.enter_degraded(&err),
            }
        }

        self.fallback.lock().unwrap().insert(key, raw, ttl);
        Ok(())
    }

    /// Removes a key from the backend (when reachable) and the fallback map.
    pub async fn delete(&self, key: &str) {
        if !self.is_degraded() {
            if let Err(err) = self.backend.delete(key).await {
                self.enter_degraded(&err);
            }
        }
        self.fallback.lock().unwrap().remove(key);
    }

    /// Probes the backend; a successful probe returns the store to backend
    /// mode. Returns whether the backend is reachable.
    pub async fn probe(&self) -> bool {
        match self.backend.ping().await {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::AcqRel) {
                    info!(cache = %self.config.name, "backend reachable again, leaving degraded mode");
                    self.config.event_listeners.emit(&CacheEvent::BackendRestored {
                        component: self.config.name.clone(),
                        timestamp: std::time::Instant::now(),
                    });
                }
                true
            }
            Err(err) => {
                debug!(cache = %self.config.name, error = %err, "backend probe failed");
                false
            }
        }
    }

    fn enter_degraded(&self, err: &BackendError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(cache = %self.config.name, error = %err, "backend unreachable, serving from in-process fallback map");
            self.config.event_listeners.emit(&CacheEvent::BackendDegraded {
                component: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                reason: err.to_string(),
            });
            #[cfg(feature = "metrics")]
            counter!("cache_degradations_total", "cache" => self.config.name.clone()).increment(1);
        }
    }

    fn report_corruption(&self, key: &str) {
        warn!(cache = %self.config.name, key, "corrupt cache entry detected, deleting");
        self.config
            .event_listeners
            .emit(&CacheEvent::CorruptionDetected {
                component: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                key: key.to_string(),
            });
        #[cfg(feature = "metrics")]
        counter!("cache_corruption_total", "cache" => self.config.name.clone()).increment(1);
    }
}
