use fetch_resilience_core::FetchError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`CircuitBreaker::execute`](crate::CircuitBreaker::execute).
#[derive(Debug, Error)]
pub enum BreakerError {
    /// The circuit denied the call without running the operation.
    #[error("circuit open for `{resource}`")]
    Open {
        /// Name of the protected resource.
        resource: String,
        /// Time remaining until the next trial is admitted, when known.
        retry_in: Option<Duration>,
    },

    /// The protected operation itself failed.
    #[error("operation failed: {0}")]
    Inner(#[from] FetchError),
}

impl BreakerError {
    /// Returns true when the call was denied by the circuit.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    /// Returns the operation error, if the operation ran.
    pub fn into_inner(self) -> Option<FetchError> {
        match self {
            BreakerError::Inner(e) => Some(e),
            BreakerError::Open { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_helpers() {
        let open = BreakerError::Open {
            resource: "api".into(),
            retry_in: None,
        };
        assert!(open.is_open());
        assert!(open.into_inner().is_none());

        let inner = BreakerError::Inner(FetchError::Upstream { status: 502 });
        assert!(!inner.is_open());
        assert_eq!(
            inner.into_inner(),
            Some(FetchError::Upstream { status: 502 })
        );
    }
}
