//! Output parsers attached to templates for downstream consumers.

use std::fmt;

use prompt_primitives::Value;

/// Parses raw model output produced from a formatted prompt.
///
/// Templates only carry the association; they never call [`OutputParser::parse`].
pub trait OutputParser: fmt::Debug + Send + Sync {
    /// Stable name written into serialized templates.
    fn parser_type(&self) -> &str;

    /// Parses model output into a structured value.
    ///
    /// # Errors
    ///
    /// Implementations return an error when `text` does not match the
    /// expected output shape.
    fn parse(&self, text: &str) -> anyhow::Result<Value>;
}

/// Passes model output through as text.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrOutputParser;

impl OutputParser for StrOutputParser {
    fn parser_type(&self) -> &str {
        "str"
    }

    fn parse(&self, text: &str) -> anyhow::Result<Value> {
        Ok(Value::Text(text.to_owned()))
    }
}
