use fetch_resilience_core::FetchError;
use thiserror::Error;

/// Errors delivered through a [`QueueHandle`](crate::QueueHandle).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The request ran and failed; retries (if any) are exhausted.
    #[error("request failed after {attempts} attempt(s): {source}")]
    Failed {
        /// Attempts made, including the first.
        attempts: u32,
        /// The final error.
        source: FetchError,
    },

    /// The request was rejected by [`clear`](crate::RequestQueue::clear)
    /// before it ran.
    #[error("queue cleared before the request ran")]
    Cleared,

    /// The queue is shut down.
    #[error("queue is shut down")]
    Shutdown,
}

impl QueueError {
    /// Returns the underlying fetch error, when the request actually ran.
    pub fn into_fetch_error(self) -> Option<FetchError> {
        match self {
            QueueError::Failed { source, .. } => Some(source),
            _ => None,
        }
    }
}
