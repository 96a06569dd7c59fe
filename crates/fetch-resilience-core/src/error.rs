//! Error taxonomy for upstream data acquisition.
//!
//! Every failure seen while talking to an upstream source is normalized into
//! a [`FetchError`]. Retry and fallthrough decisions are made from
//! [`FetchError::kind`] in exactly one place, so call sites never carry their
//! own classification logic.

use std::time::Duration;
use thiserror::Error;

/// Coarse classification of a [`FetchError`], used by the queue (retry or
/// not) and the orchestrator (fall through, cool down, or give up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call exceeded its deadline.
    Timeout,
    /// Connection-level failure (DNS, reset, refused).
    Network,
    /// Upstream answered with a 5xx status.
    Upstream,
    /// Upstream signalled quota exhaustion (HTTP 429 or equivalent).
    RateLimited,
    /// Authentication or authorization was rejected (401/403).
    Auth,
    /// The request itself is invalid and will never succeed.
    Malformed,
    /// The requested resource does not exist upstream.
    NotFound,
    /// A circuit breaker denied the call without reaching the network.
    CircuitOpen,
}

/// A failure while fetching data from an upstream source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The call did not complete within its configured deadline.
    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// Connection-level failure before a response was received.
    #[error("network error: {0}")]
    Network(String),

    /// Upstream returned a server error status.
    #[error("upstream returned status {status}")]
    Upstream {
        /// The HTTP status code, expected to be in the 5xx range.
        status: u16,
    },

    /// Upstream rejected the call because a request quota is exhausted.
    #[error("rate limited by upstream")]
    RateLimited {
        /// Upstream-suggested wait before retrying, when provided.
        retry_after: Option<Duration>,
    },

    /// Authentication or authorization failed; retrying cannot help.
    #[error("authentication rejected with status {status}")]
    Auth {
        /// The HTTP status code, 401 or 403.
        status: u16,
    },

    /// The request is structurally invalid (bad URL, missing id).
    #[error("malformed request: {0}")]
    Malformed(String),

    /// Upstream does not know the requested resource.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A circuit breaker short-circuited the call.
    #[error("circuit open for resource `{resource}`")]
    CircuitOpen {
        /// Name of the protected resource.
        resource: String,
    },
}

impl FetchError {
    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout(_) => ErrorKind::Timeout,
            FetchError::Network(_) => ErrorKind::Network,
            FetchError::Upstream { .. } => ErrorKind::Upstream,
            FetchError::RateLimited { .. } => ErrorKind::RateLimited,
            FetchError::Auth { .. } => ErrorKind::Auth,
            FetchError::Malformed(_) => ErrorKind::Malformed,
            FetchError::NotFound(_) => ErrorKind::NotFound,
            FetchError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
        }
    }

    /// Whether the queue may retry this call against the same source.
    ///
    /// Timeouts, connection failures, 5xx responses, and explicit rate
    /// limits are transient. Everything else is permanent for the source
    /// that produced it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Timeout | ErrorKind::Network | ErrorKind::Upstream | ErrorKind::RateLimited
        )
    }

    /// Whether this error indicates quota exhaustion on the source.
    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }

    /// Normalizes an HTTP status code into the matching error variant.
    ///
    /// Statuses below 400 are not errors and are rejected as `None`.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            0..=399 => None,
            401 | 403 => Some(FetchError::Auth { status }),
            404 => Some(FetchError::NotFound(format!("status {status}"))),
            429 => Some(FetchError::RateLimited { retry_after: None }),
            400..=499 => Some(FetchError::Malformed(format!("status {status}"))),
            _ => Some(FetchError::Upstream { status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(FetchError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(FetchError::Upstream { status: 503 }.is_retryable());
        assert!(FetchError::RateLimited { retry_after: None }.is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!FetchError::Auth { status: 401 }.is_retryable());
        assert!(!FetchError::Malformed("bad url".into()).is_retryable());
        assert!(!FetchError::NotFound("gone".into()).is_retryable());
        assert!(!FetchError::CircuitOpen {
            resource: "api".into()
        }
        .is_retryable());
    }

    #[test]
    fn status_normalization() {
        assert_eq!(FetchError::from_status(200), None);
        assert_eq!(
            FetchError::from_status(401),
            Some(FetchError::Auth { status: 401 })
        );
        assert_eq!(
            FetchError::from_status(429),
            Some(FetchError::RateLimited { retry_after: None })
        );
        assert_eq!(
            FetchError::from_status(500),
            Some(FetchError::Upstream { status: 500 })
        );
        assert!(matches!(
            FetchError::from_status(422),
            Some(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn rate_limit_detection() {
        assert!(FetchError::RateLimited {
            retry_after: Some(Duration::from_secs(60))
        }
        .is_rate_limited());
        assert!(!FetchError::Upstream { status: 500 }.is_rate_limited());
    }
}
