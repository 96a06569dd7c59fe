//! Pluggable storage behind the resilient store.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Failure of the backing store itself.
///
/// Any of these flips the [`ResilientStore`](crate::ResilientStore) into
/// degraded mode; callers of the store never see them.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The store could not be reached at all.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The store rejected our credentials.
    #[error("backend authentication failed")]
    Auth,

    /// The operation failed after a connection was established.
    #[error("backend io error: {0}")]
    Io(String),
}

/// Object-safe interface to a TTL key/value store.
///
/// Values are pre-serialized strings; the backend owns expiry (as a Redis
/// `SETEX` would). Implementations must be cheap to call concurrently.
pub trait CacheBackend: Send + Sync {
    /// Reads a raw value, `None` on missing or expired keys.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, BackendError>>;

    /// Writes a raw value with the given time-to-live.
    fn set<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), BackendError>>;

    /// Removes a key. Deleting a missing key is not an error.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), BackendError>>;

    /// Cheap liveness check, used by [`ResilientStore::probe`](crate::ResilientStore::probe).
    fn ping(&self) -> BoxFuture<'_, Result<(), BackendError>>;
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process [`CacheBackend`] with per-key TTL.
///
/// The default backend for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    /// Returns true when no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, BackendError>> {
        Box::pin(async move {
            let mut entries = self.entries.lock().unwrap();
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
                Some(_) => {
                    entries.remove(key);
                    Ok(None)
                }
                None => Ok(None),
            }
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), BackendError>> {
        Box::pin(async move {
            self.entries.lock().unwrap().insert(
                key.to_string(),
                MemoryEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            );
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), BackendError>> {
        Box::pin(async move {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), BackendError>> {
        Box::pin(async { Ok(()) })
    }
}
