use thiserror::Error;

use crate::constants::SERVICE_VECTOR_STORE;
use crate::error::{ErrorCategory, PipelineError};

#[derive(Debug, Error)]
/// Errors returned by vector store operations.
pub enum VectorDbError {
    /// Could not connect to the store endpoint.
    #[error("failed to connect to vector store at '{url}': {message}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// Collection creation or lookup failed.
    #[error("failed to create collection '{collection}': {message}")]
    CreateCollectionFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// Collection does not exist.
    #[error("collection not found: {collection}")]
    CollectionNotFound {
        /// Collection name.
        collection: String,
    },

    /// Upsert failed.
    #[error("failed to upsert points to '{collection}': {message}")]
    UpsertFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// Query failed.
    #[error("failed to search in '{collection}': {message}")]
    SearchFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },

    /// Vector dimension mismatch.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Collection deletion failed.
    #[error("failed to delete collection '{collection}': {message}")]
    DeleteFailed {
        /// Collection name.
        collection: String,
        /// Error message.
        message: String,
    },
}

impl VectorDbError {
    /// Network and server failures are transient; shape errors are permanent.
    pub fn category(&self) -> ErrorCategory {
        match self {
            VectorDbError::ConnectionFailed { .. }
            | VectorDbError::CreateCollectionFailed { .. }
            | VectorDbError::UpsertFailed { .. }
            | VectorDbError::SearchFailed { .. }
            | VectorDbError::DeleteFailed { .. } => ErrorCategory::Transient,
            VectorDbError::CollectionNotFound { .. } | VectorDbError::InvalidDimension { .. } => {
                ErrorCategory::Permanent
            }
        }
    }

    /// Converts into a categorized [`PipelineError`] for `operation`.
    pub fn into_pipeline(self, operation: &str) -> PipelineError {
        PipelineError::categorized(
            self.category(),
            SERVICE_VECTOR_STORE,
            operation,
            self.to_string(),
        )
    }
}
