use thiserror::Error;

use crate::error::ErrorCategory;

#[derive(Debug, Error)]
/// Errors returned by cache backends.
///
/// [`CacheStore`](super::CacheStore) never surfaces these; they are logged and turned into
/// misses or no-ops.
pub enum CacheError {
    /// Backend could not be reached.
    #[error("cache backend unavailable: {reason}")]
    Unavailable {
        /// Error message.
        reason: String,
    },

    /// Invalidation pattern is not a valid glob.
    #[error("invalid cache pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Parser message.
        reason: String,
    },

    /// Payload could not be (de)serialized.
    #[error("cache payload serialization failed: {reason}")]
    Serialization {
        /// Error message.
        reason: String,
    },
}

impl CacheError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CacheError::Unavailable { .. } => ErrorCategory::Degraded,
            CacheError::InvalidPattern { .. } | CacheError::Serialization { .. } => {
                ErrorCategory::Permanent
            }
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Convenience result type for cache backends.
pub type CacheResult<T> = Result<T, CacheError>;
