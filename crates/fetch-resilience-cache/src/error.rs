use thiserror::Error;

/// Errors returned by [`ResilientStore::set`](crate::ResilientStore::set).
///
/// Reads never fail: corruption and backend trouble both degrade to a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The value could not be serialized at all.
    #[error("value for `{key}` failed to serialize: {reason}")]
    Serialize {
        /// Key the write was addressed to.
        key: String,
        /// Serializer message.
        reason: String,
    },

    /// The serialized form matches a corruption sentinel and was not stored.
    #[error("refusing to cache corrupt payload for `{key}`")]
    RejectedSentinel {
        /// Key the write was addressed to.
        key: String,
    },
}
