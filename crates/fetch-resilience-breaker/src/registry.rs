//! Registry handing out one breaker per resource name.

use crate::breaker::CircuitBreaker;
use crate::config::BreakerConfig;
use fetch_resilience_cache::ResilientStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Creates and caches [`CircuitBreaker`] instances by resource name.
///
/// Construct one registry at process start and pass it to whatever needs
/// breakers; callers naming the same resource share the same instance (and
/// therefore the same half-open trial gate).
pub struct BreakerRegistry {
    store: Arc<ResilientStore>,
    config: BreakerConfig,
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl BreakerRegistry {
    /// Creates a registry persisting breaker status through `store`.
    pub fn new(store: Arc<ResilientStore>, config: BreakerConfig) -> Self {
        Self {
            store,
            config,
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the breaker for `name`, creating it on first use.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().unwrap();
        if let Some(existing) = breakers.get(name) {
            return Arc::clone(existing);
        }
        let created = Arc::new(CircuitBreaker::new(
            name,
            Arc::clone(&self.store),
            self.config.clone(),
        ));
        breakers.insert(name.to_string(), Arc::clone(&created));
        created
    }

    /// Names of every breaker created so far.
    pub fn names(&self) -> Vec<String> {
        self.breakers.lock().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetch_resilience_cache::{CacheConfig, MemoryBackend};

    fn registry() -> BreakerRegistry {
        let store = Arc::new(ResilientStore::new(
            Arc::new(MemoryBackend::new()),
            CacheConfig::builder().build(),
        ));
        BreakerRegistry::new(store, BreakerConfig::builder().build())
    }

    #[test]
    fn same_name_returns_the_same_instance() {
        let registry = registry();
        let a = registry.breaker("primary");
        let b = registry.breaker("primary");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn names_lists_created_breakers() {
        let registry = registry();
        registry.breaker("primary");
        registry.breaker("scraper");

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["primary", "scraper"]);
    }
}
