//! The adapter seam to concrete upstream implementations.

use crate::model::{PostData, PostRequest};
use fetch_resilience_core::FetchError;
use futures::future::BoxFuture;

/// One upstream capable of fetching post data.
///
/// Implementations wrap a concrete API client or scraper; they translate
/// whatever their upstream reports into the [`FetchError`] taxonomy and
/// nothing else. Timeouts, retries, breaker state, and caching are all
/// handled by the orchestrator around this trait.
pub trait PostSource: Send + Sync {
    /// Stable tag identifying this source ("primary-api", "scraper-a", …).
    /// Used for breaker names, rate-limit markers, and the cache source tag.
    fn name(&self) -> &str;

    /// Fetches the post addressed by `request`.
    fn fetch<'a>(&'a self, request: &'a PostRequest)
        -> BoxFuture<'a, Result<PostData, FetchError>>;
}
