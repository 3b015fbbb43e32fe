use thiserror::Error;

use crate::constants::SERVICE_LLM;
use crate::error::{ErrorCategory, PipelineError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LlmError {
    #[error("LLM provider rate limited the request")]
    RateLimited,

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM provider server error: {message}")]
    Server { message: String },

    #[error("LLM provider rejected credentials: {message}")]
    Unauthorized { message: String },

    #[error("LLM provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM response failed validation: {reason}")]
    InvalidResponse { reason: String },
}

impl LlmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LlmError::RateLimited | LlmError::Timeout | LlmError::Server { .. } => {
                ErrorCategory::Transient
            }
            LlmError::Unauthorized { .. }
            | LlmError::EmptyResponse
            | LlmError::InvalidResponse { .. } => ErrorCategory::Permanent,
            LlmError::Unavailable { .. } => ErrorCategory::Degraded,
        }
    }

    pub fn into_pipeline(self, operation: &str) -> PipelineError {
        PipelineError::categorized(self.category(), SERVICE_LLM, operation, self.to_string())
    }

    /// Classifies a provider error message.
    ///
    /// Provider SDKs surface HTTP failures as text, so the status is recovered from the
    /// message. Anything unrecognized counts as the provider being unavailable.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        let has = |needle: &str| lower.contains(needle);

        if has("429") || has("rate limit") || has("too many requests") {
            LlmError::RateLimited
        } else if has("timed out") || has("timeout") {
            LlmError::Timeout
        } else if has("401") || has("403") || has("unauthorized") || has("api key") || has("forbidden") {
            LlmError::Unauthorized {
                message: message.to_string(),
            }
        } else if has("500") || has("502") || has("503") || has("504") || has("server error") {
            LlmError::Server {
                message: message.to_string(),
            }
        } else {
            LlmError::Unavailable {
                message: message.to_string(),
            }
        }
    }
}
