//! Shared error definitions for prompt primitives.

use thiserror::Error;

/// Result alias used throughout the prompt primitives.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating prompt primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// A message role label did not match any known role.
    #[error("unknown message role `{role}`")]
    UnknownRole {
        /// The offending role label.
        role: String,
    },
}
