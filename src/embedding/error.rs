use thiserror::Error;

use crate::constants::SERVICE_EMBEDDING;
use crate::error::{ErrorCategory, PipelineError};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {reason}")]
    Request { reason: String },

    #[error("embedding request timed out: {reason}")]
    Timeout { reason: String },

    #[error("embedding provider rate limited the request")]
    RateLimited,

    #[error("embedding provider returned server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("embedding provider rejected credentials ({status})")]
    Unauthorized { status: u16 },

    #[error("embedding provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid embedding configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EmbeddingError::Request { .. }
            | EmbeddingError::Timeout { .. }
            | EmbeddingError::RateLimited
            | EmbeddingError::Server { .. } => ErrorCategory::Transient,
            EmbeddingError::Unauthorized { .. }
            | EmbeddingError::Rejected { .. }
            | EmbeddingError::InvalidResponse { .. }
            | EmbeddingError::DimensionMismatch { .. }
            | EmbeddingError::InvalidConfig { .. } => ErrorCategory::Permanent,
        }
    }

    /// Converts into a categorized [`PipelineError`] for `operation`.
    pub fn into_pipeline(self, operation: &str) -> PipelineError {
        PipelineError::categorized(self.category(), SERVICE_EMBEDDING, operation, self.to_string())
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbeddingError::Timeout {
                reason: err.to_string(),
            }
        } else if err.is_decode() {
            EmbeddingError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            EmbeddingError::Request {
                reason: err.to_string(),
            }
        }
    }
}
