//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment value could not be parsed as an integer.
    #[error("failed to parse {name}='{value}' as an integer: {source}")]
    IntParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Environment value could not be parsed as a float.
    #[error("failed to parse {name}='{value}' as a number: {source}")]
    FloatParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Environment value could not be parsed as a boolean.
    #[error("invalid boolean for {name}: '{value}' (expected true/false/1/0)")]
    InvalidBool { name: &'static str, value: String },

    /// A value is outside its allowed range.
    #[error("{field} out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    /// Two settings contradict each other.
    #[error("inconsistent configuration: {reason}")]
    Inconsistent { reason: String },
}
