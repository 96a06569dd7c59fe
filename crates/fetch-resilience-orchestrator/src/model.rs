//! Domain model for fetched posts.

use fetch_resilience_core::FetchError;
use serde::{Deserialize, Serialize};

/// Engagement counters of a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    /// Like count.
    pub likes: u64,
    /// Repost/share count.
    pub reposts: u64,
    /// Reply count.
    pub replies: u64,
}

/// Author information attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Handle, without the leading `@`.
    pub username: String,
    /// Display name; falls back to the username upstream.
    pub display_name: String,
    /// Whether the account is verified.
    pub verified: bool,
    /// Follower count at fetch time.
    pub followers: u64,
    /// Following count at fetch time.
    pub following: u64,
}

/// One fetched post, as produced by a source adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostData {
    /// Numeric post id, as a string.
    pub post_id: String,
    /// Author details.
    pub author: Author,
    /// Post text.
    pub content: String,
    /// Engagement counters.
    pub engagement: Engagement,
    /// Upstream creation timestamp, ISO 8601 as reported.
    pub created_at: String,
    /// Tag of the source that produced this record. Filled in by the
    /// orchestrator before caching.
    pub source: String,
}

/// Engagement-only view of a post, cached with a short TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    /// Numeric post id, as a string.
    pub post_id: String,
    /// Like count.
    pub likes: u64,
    /// Repost/share count.
    pub reposts: u64,
    /// Reply count.
    pub replies: u64,
    /// Tag of the source the counters came from.
    pub source: String,
}

impl From<&PostData> for EngagementSnapshot {
    fn from(data: &PostData) -> Self {
        Self {
            post_id: data.post_id.clone(),
            likes: data.engagement.likes,
            reposts: data.engagement.reposts,
            replies: data.engagement.replies,
            source: data.source.clone(),
        }
    }
}

/// A request to fetch one post by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    /// Post URL, `https://<host>/<username>/status/<digits>`.
    pub url: String,
    /// Queue priority; higher is served first.
    pub priority: i32,
}

impl PostRequest {
    /// Creates a request with the default priority (0).
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self {
            url: url.into(),
            priority: 0,
        }
    }

    /// Sets the queue priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Extracts the numeric post id from the URL.
    pub fn post_id(&self) -> Result<&str, FetchError> {
        let rest = self
            .url
            .split_once("/status/")
            .map(|(_, rest)| rest)
            .ok_or_else(|| FetchError::Malformed(format!("no status id in `{}`", self.url)))?;
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(FetchError::Malformed(format!(
                "no status id in `{}`",
                self.url
            )));
        }
        Ok(&rest[..end])
    }

    /// Extracts the author username from the URL.
    pub fn username(&self) -> Result<&str, FetchError> {
        let before = self
            .url
            .split_once("/status/")
            .map(|(before, _)| before)
            .ok_or_else(|| FetchError::Malformed(format!("no username in `{}`", self.url)))?;
        match before.rsplit('/').next() {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(FetchError::Malformed(format!(
                "no username in `{}`",
                self.url
            ))),
        }
    }
}
