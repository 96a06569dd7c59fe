use fetch_resilience_core::FetchError;
use std::fmt;
use thiserror::Error;

/// One failed source attempt inside an [`OrchestratorError::Exhausted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// Tag of the source that failed.
    pub source: String,
    /// The error it failed with.
    pub error: FetchError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Errors surfaced by the orchestrator.
///
/// This is the whole caller-visible failure surface: raw adapter, queue, and
/// breaker errors never escape.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request itself is invalid (unparseable post URL).
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] FetchError),

    /// Every eligible source failed; the data is unavailable right now.
    #[error("no source available for `{key}`")]
    Exhausted {
        /// Cache key of the requested entity.
        key: String,
        /// What each attempted source failed with.
        attempts: Vec<SourceFailure>,
    },
}

impl OrchestratorError {
    /// Returns true for the "no data right now" case that callers are
    /// expected to tolerate.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, OrchestratorError::Exhausted { .. })
    }
}
