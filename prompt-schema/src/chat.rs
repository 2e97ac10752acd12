//! Chat prompt templates producing role-tagged message sequences.

use prompt_primitives::{ChatMessage, MessageRole};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::base::{TemplateBase, Variables};
use crate::error::PromptResult;
use crate::string::{extract_variable_refs, render};
use crate::template::{PromptTemplate, PromptValue};

/// One message of a chat template before rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTemplate {
    #[serde(deserialize_with = "parse_role")]
    role: MessageRole,
    template: String,
}

impl MessageTemplate {
    /// Creates a message template for `role`.
    #[must_use]
    pub fn new(role: MessageRole, template: impl Into<String>) -> Self {
        Self {
            role,
            template: template.into(),
        }
    }

    /// Returns the message role.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

/// Accepts role labels and their aliases (`human`, `ai`) in any case.
fn parse_role<'de, D>(deserializer: D) -> Result<MessageRole, D::Error>
where
    D: Deserializer<'de>,
{
    let label = String::deserialize(deserializer)?;
    label.parse().map_err(de::Error::custom)
}

/// A sequence of message templates rendered into a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatPromptTemplate {
    #[serde(flatten)]
    base: TemplateBase,
    messages: Vec<MessageTemplate>,
}

impl ChatPromptTemplate {
    /// Creates a chat template from `(role, template)` pairs.
    ///
    /// Input variables are inferred from the placeholders of every message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PromptError::Validation`] if a placeholder is named `stop`.
    pub fn from_messages<I, S>(messages: I) -> PromptResult<Self>
    where
        I: IntoIterator<Item = (MessageRole, S)>,
        S: Into<String>,
    {
        let messages: Vec<MessageTemplate> = messages
            .into_iter()
            .map(|(role, template)| MessageTemplate::new(role, template))
            .collect();
        let input_variables = messages
            .iter()
            .flat_map(|message| extract_variable_refs(&message.template));

        Ok(Self {
            base: TemplateBase::new(input_variables)?,
            messages,
        })
    }

    /// Returns the message templates in order.
    #[must_use]
    pub fn messages(&self) -> &[MessageTemplate] {
        &self.messages
    }

    fn format_messages(&self, variables: &Variables) -> PromptResult<Vec<ChatMessage>> {
        let prepared = self.prepare_variables(variables);
        self.messages
            .iter()
            .map(|message| {
                render(&message.template, &prepared)
                    .map(|content| ChatMessage::new(message.role, content))
            })
            .collect()
    }
}

impl PromptTemplate for ChatPromptTemplate {
    fn base(&self) -> &TemplateBase {
        &self.base
    }

    fn with_base(&self, base: TemplateBase) -> Self {
        Self {
            base,
            messages: self.messages.clone(),
        }
    }

    fn prompt_type(&self) -> &'static str {
        "chat"
    }

    fn format(&self, variables: &Variables) -> PromptResult<String> {
        self.format_prompt(variables).map(|prompt| prompt.to_text())
    }

    fn format_prompt(&self, variables: &Variables) -> PromptResult<PromptValue> {
        self.format_messages(variables).map(PromptValue::Chat)
    }
}

#[cfg(test)]
mod tests {
    use prompt_primitives::Value;

    use super::*;
    use crate::error::PromptError;

    fn chat() -> ChatPromptTemplate {
        ChatPromptTemplate::from_messages([
            (MessageRole::System, "You are {{persona}}."),
            (MessageRole::User, "{{question}}"),
            (MessageRole::Assistant, "Let me think about {{question}}."),
        ])
        .unwrap()
    }

    #[test]
    fn infers_variables_across_messages() {
        assert_eq!(chat().input_variables(), ["persona", "question"]);
    }

    #[test]
    fn renders_messages_in_order() {
        let mut variables = Variables::new();
        variables.insert("persona".to_owned(), Value::from("a tutor"));
        variables.insert("question".to_owned(), Value::from("what is rust"));

        let prompt = chat().format_prompt(&variables).unwrap();
        assert_eq!(
            prompt.to_messages(),
            vec![
                ChatMessage::new(MessageRole::System, "You are a tutor."),
                ChatMessage::new(MessageRole::User, "what is rust"),
                ChatMessage::new(MessageRole::Assistant, "Let me think about what is rust."),
            ]
        );
        assert_eq!(
            chat().format(&variables).unwrap(),
            "System: You are a tutor.\nHuman: what is rust\nAI: Let me think about what is rust."
        );
    }

    #[test]
    fn partial_keeps_messages() {
        let partial = chat().partial([("persona", "a pirate")]).unwrap();
        assert_eq!(partial.input_variables(), ["question"]);
        assert_eq!(partial.messages().len(), 3);

        let mut variables = Variables::new();
        variables.insert("question".to_owned(), Value::from("ahoy?"));
        let prompt = partial.format_prompt(&variables).unwrap();
        assert_eq!(prompt.to_messages()[0].content(), "You are a pirate.");
    }

    #[test]
    fn loads_role_aliases_and_rejects_unknown_roles() {
        let loaded: ChatPromptTemplate = serde_json::from_value(serde_json::json!({
            "input_variables": ["q"],
            "messages": [
                {"role": "Human", "template": "{{q}}"},
                {"role": "ai", "template": "ok"},
                {"role": "tool", "template": "done"},
            ],
        }))
        .unwrap();
        let roles: Vec<_> = loaded.messages().iter().map(MessageTemplate::role).collect();
        assert_eq!(roles, [MessageRole::User, MessageRole::Assistant, MessageRole::Tool]);

        let err = serde_json::from_value::<MessageTemplate>(
            serde_json::json!({"role": "narrator", "template": "hi"}),
        )
        .expect_err("should fail");
        assert!(err.to_string().contains("unknown message role `narrator`"));
    }

    #[test]
    fn rejects_stop_placeholder() {
        let err = ChatPromptTemplate::from_messages([(MessageRole::User, "{{stop}}")])
            .expect_err("should fail");
        assert!(matches!(err, PromptError::Validation { .. }));
    }
}
