//! Core shared types for prompt templates.

#![warn(missing_docs, clippy::pedantic)]

mod document;
mod error;
mod message;
mod value;

/// Documents carrying page content and metadata.
pub use document::Document;
/// Error type and result alias for the primitive types.
pub use error::{Error, Result};
/// Chat-style messages produced by chat prompt templates.
pub use message::{ChatMessage, MessageRole};
/// Dynamic runtime values and their kind hierarchy.
pub use value::{Value, ValueKind, ValueMap};
