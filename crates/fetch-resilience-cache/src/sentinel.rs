//! Corruption sentinel detection.
//!
//! A prior serialization bug in an upstream process can leave well-known
//! garbage in the store: a stringified-object placeholder, the bare words
//! `undefined`/`null`, or an error payload that was cached instead of real
//! data. These are detected on both read and write so they never reach a
//! caller.

/// Placeholder produced by stringifying an object instead of serializing it.
const OBJECT_PLACEHOLDER: &str = "[object Object]";

/// Marker found in error payloads that must never be cached as data.
const SERIALIZATION_FAILED: &str = "serialization_failed";

/// Whether a raw stored value matches a known corruption pattern.
pub(crate) fn is_corrupt(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        return true;
    }
    if trimmed.contains(OBJECT_PLACEHOLDER) {
        return true;
    }
    // Error-shaped payloads: {"error": "serialization_failed", ...}
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value
            .get("error")
            .and_then(|v| v.as_str())
            .is_some_and(|e| e == SERIALIZATION_FAILED)
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_sentinels() {
        assert!(is_corrupt("null"));
        assert!(is_corrupt("undefined"));
        assert!(is_corrupt("  null  "));
        assert!(is_corrupt(""));
        assert!(is_corrupt("[object Object]"));
        assert!(is_corrupt(r#"{"data":"[object Object]"}"#));
        assert!(is_corrupt(
            r#"{"error":"serialization_failed","detail":"cache write"}"#
        ));
    }

    #[test]
    fn accepts_real_values() {
        assert!(!is_corrupt(r#""null""#)); // the *string* "null" is data
        assert!(!is_corrupt(r#"{"likes":10,"reposts":2}"#));
        assert!(!is_corrupt(r#"{"error":"not_found"}"#));
        assert!(!is_corrupt("42"));
    }
}
