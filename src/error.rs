//! Categorized pipeline errors.
//!
//! Every component boundary returns [`PipelineError`]. The category decides what the caller
//! does next: retry and trip breakers on [`ErrorCategory::Transient`], stop on
//! [`ErrorCategory::Permanent`], fall back on [`ErrorCategory::Degraded`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handling category for a failed external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failure (timeout, 5xx, rate limit). May be retried.
    Transient,
    /// Configuration, auth or input failure. Never retried.
    Permanent,
    /// The dependency is unavailable but a lower-quality fallback exists.
    Degraded,
}

impl ErrorCategory {
    /// Short lowercase label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
            ErrorCategory::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
/// Error surfaced at component boundaries.
pub enum PipelineError {
    /// Temporary failure of an external service.
    #[error("transient failure in {service}.{operation}: {message}")]
    Transient {
        /// Service name (e.g. `vector_store`).
        service: String,
        /// Operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    /// Non-retryable failure.
    #[error("permanent failure in {service}.{operation}: {message}")]
    Permanent {
        /// Service name.
        service: String,
        /// Operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    /// Dependency unavailable; caller should use its fallback.
    #[error("{service}.{operation} degraded: {message}")]
    Degraded {
        /// Service name.
        service: String,
        /// Operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    /// Call rejected by an open circuit breaker (always transient).
    #[error("circuit open for {service}, rejected {operation}")]
    CircuitOpen {
        /// Service name.
        service: String,
        /// Operation that was rejected.
        operation: String,
    },
}

impl PipelineError {
    pub fn transient(service: &str, operation: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            service: service.to_string(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn permanent(service: &str, operation: &str, message: impl Into<String>) -> Self {
        Self::Permanent {
            service: service.to_string(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn degraded(service: &str, operation: &str, message: impl Into<String>) -> Self {
        Self::Degraded {
            service: service.to_string(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn circuit_open(service: &str, operation: &str) -> Self {
        Self::CircuitOpen {
            service: service.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Builds an error of the given category.
    pub fn categorized(
        category: ErrorCategory,
        service: &str,
        operation: &str,
        message: impl Into<String>,
    ) -> Self {
        match category {
            ErrorCategory::Transient => Self::transient(service, operation, message),
            ErrorCategory::Permanent => Self::permanent(service, operation, message),
            ErrorCategory::Degraded => Self::degraded(service, operation, message),
        }
    }

    /// Returns the handling category. Open-circuit rejections are transient.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Transient { .. } | PipelineError::CircuitOpen { .. } => {
                ErrorCategory::Transient
            }
            PipelineError::Permanent { .. } => ErrorCategory::Permanent,
            PipelineError::Degraded { .. } => ErrorCategory::Degraded,
        }
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    #[inline]
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, PipelineError::CircuitOpen { .. })
    }

    pub fn service(&self) -> &str {
        match self {
            PipelineError::Transient { service, .. }
            | PipelineError::Permanent { service, .. }
            | PipelineError::Degraded { service, .. }
            | PipelineError::CircuitOpen { service, .. } => service,
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            PipelineError::Transient { operation, .. }
            | PipelineError::Permanent { operation, .. }
            | PipelineError::Degraded { operation, .. }
            | PipelineError::CircuitOpen { operation, .. } => operation,
        }
    }
}

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
