//! Cache key namespacing.
//!
//! Consumers must not assume anything about key layout beyond the
//! `<namespace>:<identifier>` convention encoded here.

/// Prefix for persisted circuit breaker status.
pub const CIRCUIT_BREAKER: &str = "circuit_breaker";

/// Prefix for persisted rate-limit cooldown markers.
pub const RATE_LIMIT: &str = "rate_limit";

/// Prefix for cached post payloads.
pub const POST: &str = "post";

/// Prefix for cached engagement snapshots.
pub const ENGAGEMENT: &str = "engagement";

/// Key for the persisted status of the named circuit breaker.
pub fn circuit_breaker(name: &str) -> String {
    format!("{CIRCUIT_BREAKER}:{name}")
}

/// Key for the rate-limit cooldown marker of the named operation or source.
pub fn rate_limit(name: &str) -> String {
    format!("{RATE_LIMIT}:{name}")
}

/// Key for a cached post payload.
pub fn post(id: &str) -> String {
    format!("{POST}:{id}")
}

/// Key for a cached engagement snapshot.
pub fn engagement(id: &str) -> String {
    format!("{ENGAGEMENT}:{id}")
}
