//! Cache corruption and degradation scenarios.

use fetch_resilience_cache::{CacheBackend, CacheConfig, MemoryBackend, ResilientStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn error_shaped_fallback_payloads_never_come_back_out() {
    let backend = Arc::new(MemoryBackend::new());
    let store = ResilientStore::new(
        Arc::clone(&backend) as Arc<dyn CacheBackend>,
        CacheConfig::builder().name("posts").build(),
    );

    // The write path refuses the payload outright.
    let payload = json!({"error": "serialization_failed", "tweet_id": "42"});
    assert!(store
        .set("post:42", &payload, Duration::from_secs(300))
        .await
        .is_err());
    assert_eq!(store.get::<serde_json::Value>("post:42").await, None);

    // A payload that slipped in through another writer is deleted on read.
    backend
        .set(
            "post:42",
            payload.to_string(),
            Duration::from_secs(300),
        )
        .await
        .unwrap();
    assert_eq!(store.get::<serde_json::Value>("post:42").await, None);
    assert_eq!(backend.get("post:42").await.unwrap(), None);
}

#[tokio::test]
async fn legacy_stringified_garbage_is_treated_as_a_miss() {
    let backend = Arc::new(MemoryBackend::new());
    let store = ResilientStore::new(
        Arc::clone(&backend) as Arc<dyn CacheBackend>,
        CacheConfig::builder().build(),
    );

    for garbage in ["[object Object]", "undefined", "null"] {
        backend
            .set("post:1", garbage.to_string(), Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(store.get::<serde_json::Value>("post:1").await, None);
        assert_eq!(backend.get("post:1").await.unwrap(), None);
    }
}

#[tokio::test]
async fn values_round_trip_and_reads_do_not_mutate() {
    let store = ResilientStore::new(
        Arc::new(MemoryBackend::new()),
        CacheConfig::builder().build(),
    );

    let value = json!({
        "tweet_id": "1234567890",
        "content": "hello world",
        "engagement": {"likes": 12, "reposts": 3},
    });
    store
        .set("post:1234567890", &value, Duration::from_secs(300))
        .await
        .unwrap();

    let first = store.get::<serde_json::Value>("post:1234567890").await;
    let second = store.get::<serde_json::Value>("post:1234567890").await;
    assert_eq!(first, Some(value));
    assert_eq!(second, first);
}
