//! Saving templates to and loading them from JSON or YAML files.

use std::fs;
use std::path::Path;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::base::{TemplateBase, Variables};
use crate::chat::ChatPromptTemplate;
use crate::error::{PromptError, PromptResult};
use crate::string::StringPromptTemplate;
use crate::template::{PromptTemplate, PromptValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    fn from_path(path: &Path) -> PromptResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml") => Ok(Self::Yaml),
            _ => Err(PromptError::configuration(format!(
                "{} must be json or yaml",
                path.display()
            ))),
        }
    }
}

pub(crate) fn save<T>(template: &T, path: &Path) -> PromptResult<()>
where
    T: PromptTemplate + Serialize,
{
    if !template.base().partial_variables().is_empty() {
        return Err(PromptError::validation(
            "cannot save prompt with partial variables",
        ));
    }
    let format = FileFormat::from_path(path)?;
    let dict = template.to_dict()?;

    let encoded = match format {
        FileFormat::Json => encode_json(&dict)?,
        FileFormat::Yaml => serde_yaml::to_string(&dict)?,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encoded)?;

    info!(
        path = %path.display(),
        prompt_type = template.prompt_type(),
        "prompt template saved"
    );
    Ok(())
}

fn encode_json(dict: &serde_json::Value) -> PromptResult<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    dict.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|err| PromptError::serialization(err.to_string()))
}

/// A template restored from disk.
#[derive(Clone, Debug)]
pub enum LoadedPrompt {
    /// A `_type: prompt` template.
    Text(StringPromptTemplate),
    /// A `_type: chat` template.
    Chat(ChatPromptTemplate),
}

/// Loads a template previously written by [`PromptTemplate::save`].
///
/// A missing `_type` field defaults to `prompt`.
///
/// # Errors
///
/// Returns [`PromptError::Configuration`] for unsupported extensions or an
/// unknown `_type`, [`PromptError::Validation`] when the stored variables are
/// invalid, and I/O or decoding errors.
pub fn load_prompt(path: impl AsRef<Path>) -> PromptResult<LoadedPrompt> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    let contents = fs::read_to_string(path)?;

    let dict: serde_json::Value = match format {
        FileFormat::Json => serde_json::from_str(&contents)?,
        FileFormat::Yaml => serde_yaml::from_str(&contents)?,
    };
    let prompt_type = dict
        .get("_type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("prompt")
        .to_owned();
    debug!(path = %path.display(), %prompt_type, "loading prompt template");

    match prompt_type.as_str() {
        "prompt" => Ok(LoadedPrompt::Text(serde_json::from_value(dict)?)),
        "chat" => Ok(LoadedPrompt::Chat(serde_json::from_value(dict)?)),
        other => Err(PromptError::configuration(format!(
            "unsupported prompt type `{other}`"
        ))),
    }
}

impl PromptTemplate for LoadedPrompt {
    fn base(&self) -> &TemplateBase {
        match self {
            Self::Text(template) => template.base(),
            Self::Chat(template) => template.base(),
        }
    }

    fn with_base(&self, base: TemplateBase) -> Self {
        match self {
            Self::Text(template) => Self::Text(template.with_base(base)),
            Self::Chat(template) => Self::Chat(template.with_base(base)),
        }
    }

    fn prompt_type(&self) -> &'static str {
        match self {
            Self::Text(template) => template.prompt_type(),
            Self::Chat(template) => template.prompt_type(),
        }
    }

    fn format(&self, variables: &Variables) -> PromptResult<String> {
        match self {
            Self::Text(template) => template.format(variables),
            Self::Chat(template) => template.format(variables),
        }
    }

    fn format_prompt(&self, variables: &Variables) -> PromptResult<PromptValue> {
        match self {
            Self::Text(template) => template.format_prompt(variables),
            Self::Chat(template) => template.format_prompt(variables),
        }
    }
}

impl Serialize for LoadedPrompt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(template) => template.serialize(serializer),
            Self::Chat(template) => template.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use prompt_primitives::{MessageRole, Value};
    use tempfile::tempdir;

    use super::*;
    use crate::parser::StrOutputParser;
    use crate::partial::PartialValue;

    #[test]
    fn writes_indented_json_with_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/prompt.json");
        let template = StringPromptTemplate::from_template("Hi {{name}}").unwrap();

        template.save(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n    \"input_variables\": [\n        \"name\"\n    ]"));
        let dict: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(dict["_type"], "prompt");
        assert_eq!(dict["template"], "Hi {{name}}");
        assert!(dict["output_parser"].is_null());
        assert!(dict.get("formatters").is_none());
    }

    #[test]
    fn writes_block_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompt.yaml");
        let template = StringPromptTemplate::from_template("{{a}} {{b}}").unwrap();

        template.save(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("input_variables:\n- a\n- b\n"));
        assert!(contents.contains("_type: prompt"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        let template = StringPromptTemplate::from_template("{{a}}").unwrap();

        let err = template.save(&path).expect_err("should fail");
        assert!(matches!(err, PromptError::Configuration { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn rejects_partial_templates_regardless_of_extension() {
        let dir = tempdir().unwrap();
        let template = StringPromptTemplate::from_template("{{a}} {{b}}")
            .unwrap()
            .partial([("a", "x")])
            .unwrap();

        for name in ["p.json", "p.yaml", "p.txt"] {
            let err = template.save(dir.path().join(name)).expect_err("should fail");
            assert!(matches!(err, PromptError::Validation { .. }));
        }
    }

    #[test]
    fn serializes_output_parser_by_type() {
        let template = StringPromptTemplate::builder("{{q}}")
            .with_output_parser(Arc::new(StrOutputParser))
            .build()
            .unwrap();
        let dict = template.to_dict().unwrap();
        assert_eq!(dict["output_parser"]["_type"], "str");
    }

    #[test]
    fn producer_partials_fail_to_serialize() {
        let template = StringPromptTemplate::builder("{{now}}")
            .with_partial_variable("now", PartialValue::producer(|| "12:00".to_owned()))
            .build()
            .unwrap();
        let err = template.to_dict().expect_err("should fail");
        assert!(matches!(err, PromptError::Serialization { .. }));
    }

    #[test]
    fn round_trips_text_and_chat_templates() {
        let dir = tempdir().unwrap();
        let text_path = dir.path().join("text.yaml");
        let chat_path = dir.path().join("chat.json");

        StringPromptTemplate::from_template("Hello {{name}}")
            .unwrap()
            .save(&text_path)
            .unwrap();
        ChatPromptTemplate::from_messages([(MessageRole::System, "Be {{tone}}")])
            .unwrap()
            .save(&chat_path)
            .unwrap();

        let mut variables = Variables::new();
        variables.insert("name".to_owned(), Value::from("Ada"));
        variables.insert("tone".to_owned(), Value::from("kind"));

        let text = load_prompt(&text_path).unwrap();
        assert!(matches!(text, LoadedPrompt::Text(_)));
        assert_eq!(text.format(&variables).unwrap(), "Hello Ada");

        let chat = load_prompt(&chat_path).unwrap();
        assert_eq!(chat.prompt_type(), "chat");
        assert_eq!(chat.input_variables(), ["tone"]);
        assert_eq!(chat.format(&variables).unwrap(), "System: Be kind");
    }

    #[test]
    fn load_defaults_to_text_and_rejects_unknown_types() {
        let dir = tempdir().unwrap();
        let untyped = dir.path().join("untyped.json");
        fs::write(&untyped, r#"{"input_variables": ["x"], "template": "{{x}}!"}"#).unwrap();
        assert!(matches!(load_prompt(&untyped).unwrap(), LoadedPrompt::Text(_)));

        let unknown = dir.path().join("unknown.json");
        fs::write(&unknown, r#"{"_type": "few_shot", "input_variables": []}"#).unwrap();
        let err = load_prompt(&unknown).expect_err("should fail");
        assert!(matches!(err, PromptError::Configuration { .. }));
    }

    #[test]
    fn load_revalidates_variables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{"_type": "prompt", "input_variables": ["stop"], "template": "{{stop}}"}"#,
        )
        .unwrap();
        let err = load_prompt(&path).expect_err("should fail");
        assert!(err.to_string().contains("stop"));
    }
}
