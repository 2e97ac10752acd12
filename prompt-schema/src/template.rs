//! The prompt template contract shared by every template kind.

use std::path::Path;

use prompt_primitives::{ChatMessage, MessageRole};
use serde::{Deserialize, Serialize};

use crate::base::{TemplateBase, Variables};
use crate::error::{PromptError, PromptResult};
use crate::parser::OutputParser;
use crate::partial::PartialValue;
use crate::persist;
use crate::run::{self, RunConfig};

/// Rendered output of a prompt template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PromptValue {
    /// A single block of text for completion-style models.
    Text(String),
    /// An ordered conversation for chat-style models.
    Chat(Vec<ChatMessage>),
}

impl PromptValue {
    /// Flattens the prompt into a single string.
    ///
    /// Chat prompts become one `Speaker: content` line per message.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Chat(messages) => messages
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Converts the prompt into chat messages.
    ///
    /// Text prompts become a single user message.
    #[must_use]
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        match self {
            Self::Text(text) => vec![ChatMessage::new(MessageRole::User, text.clone())],
            Self::Chat(messages) => messages.clone(),
        }
    }
}

/// A template that turns named variables into a prompt.
///
/// Implementors hold a [`TemplateBase`] and provide the rendering step;
/// variable preparation, partial binding, invocation and persistence are
/// provided on top of it.
pub trait PromptTemplate {
    /// Returns the shared template state.
    fn base(&self) -> &TemplateBase;

    /// Returns a copy of this template carrying `base` instead of its own.
    #[must_use]
    fn with_base(&self, base: TemplateBase) -> Self
    where
        Self: Sized;

    /// Discriminator written as `_type` when the template is serialized.
    fn prompt_type(&self) -> &'static str;

    /// Formats the template into a string.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::MissingVariable`] when a placeholder has no value.
    fn format(&self, variables: &Variables) -> PromptResult<String>;

    /// Formats the template into a [`PromptValue`].
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::MissingVariable`] when a placeholder has no value.
    fn format_prompt(&self, variables: &Variables) -> PromptResult<PromptValue>;

    /// Returns the variables that must be supplied at format time.
    fn input_variables(&self) -> &[String] {
        self.base().input_variables()
    }

    /// Returns the output parser associated with this template.
    fn output_parser(&self) -> Option<&std::sync::Arc<dyn OutputParser>> {
        self.base().output_parser()
    }

    /// Merges partial and supplied variables and runs them through the formatters.
    fn prepare_variables(&self, supplied: &Variables) -> Variables {
        self.base().prepare_variables(supplied)
    }

    /// Returns a new template with `bindings` pre-bound as partial variables.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] when the derived variables are invalid.
    fn partial<I, K, V>(&self, bindings: I) -> PromptResult<Self>
    where
        Self: Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PartialValue>,
    {
        Ok(self.with_base(self.base().partial(bindings)?))
    }

    /// Formats the prompt as a single pipeline step with `run_type = "prompt"`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`PromptTemplate::format_prompt`].
    fn invoke(&self, input: &Variables, config: Option<&RunConfig>) -> PromptResult<PromptValue> {
        run::call_with_config(config, "prompt", || self.format_prompt(input))
    }

    /// Returns the dictionary representation written by [`PromptTemplate::save`].
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Serialization`] when a field cannot be encoded,
    /// e.g. a producer partial variable.
    fn to_dict(&self) -> PromptResult<serde_json::Value>
    where
        Self: Serialize + Sized,
    {
        let mut dict = serde_json::to_value(self)?;
        let serde_json::Value::Object(fields) = &mut dict else {
            return Err(PromptError::serialization(
                "prompt template must serialize to a map",
            ));
        };
        fields.insert(
            "_type".to_owned(),
            serde_json::Value::String(self.prompt_type().to_owned()),
        );
        Ok(dict)
    }

    /// Saves the template as JSON or YAML depending on the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] when partial variables are bound,
    /// [`PromptError::Configuration`] for unsupported extensions, and I/O or
    /// serialization errors from writing the file.
    fn save(&self, path: impl AsRef<Path>) -> PromptResult<()>
    where
        Self: Serialize + Sized,
    {
        persist::save(self, path.as_ref())
    }
}
