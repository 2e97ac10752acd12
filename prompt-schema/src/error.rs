//! Error types for prompt template operations.

use thiserror::Error;

/// Result alias for prompt template operations.
pub type PromptResult<T> = Result<T, PromptError>;

/// Errors that can occur while building, formatting or persisting templates.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Template variables or inputs failed validation.
    #[error("validation error: {reason}")]
    Validation {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The template was asked to do something its configuration does not allow.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A placeholder had no value at render time.
    #[error("missing required variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// Encoding or decoding a template representation failed.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Reason reported by the encoder.
        reason: String,
    },

    /// Underlying I/O failure while reading or writing template files.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
}

impl PromptError {
    /// Convenience constructor for validation failures.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for configuration failures.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for serialization failures.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for PromptError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
