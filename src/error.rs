//! Cache Error Types
//!
//! One variant per failure class the cache can surface. The default-returning
//! facade methods swallow these into sentinel values; the `*_or_fail`
//! variants propagate them.

/// Cache error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Key cannot be represented at the API boundary. Unreachable through
    /// the typed Rust API (any byte slice is a valid key); kept for callers
    /// bridging from untyped inputs.
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Key Codec could not encode the key. A programming error if it ever
    /// occurs: every byte string is representable under the base64 transform.
    #[error("Cannot encode key: {0}")]
    Encoding(String),

    /// Token is not a well-formed key encoding.
    #[error("Cannot decode token {token:?}: {reason}")]
    Decoding { token: String, reason: String },

    /// No live entry: absent, expired, or lost to a concurrent removal.
    /// Recoverable via the default-returning facade methods.
    #[error("No live cache entry for the requested key")]
    Unavailable,

    /// Payload could not be serialized or deserialized.
    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying filesystem operation failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Build a decoding error for a malformed token.
    pub fn decoding(token: &str, reason: impl ToString) -> Self {
        CacheError::Decoding {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is an ordinary cache miss rather than a fault.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Unavailable)
    }
}
