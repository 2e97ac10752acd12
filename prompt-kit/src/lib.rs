//! Prompt template toolkit facade.
//!
//! Depend on this crate via `cargo add prompt-kit`. It bundles the workspace
//! crates behind feature flags so downstream users can pull in only the
//! primitives when they do not need the template contract.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use prompt_primitives as primitives;

/// Prompt template contract (enabled by `schema` feature).
#[cfg(feature = "schema")]
pub use prompt_schema as schema;
