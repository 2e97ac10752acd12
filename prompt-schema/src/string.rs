//! Text prompt templates with `{{variable}}` placeholders.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::base::{TemplateBase, Variables};
use crate::error::{PromptError, PromptResult};
use crate::formatter::FormatterRegistry;
use crate::parser::OutputParser;
use crate::partial::PartialValue;
use crate::template::{PromptTemplate, PromptValue};

/// A text template with `{{variable}}` substitution.
///
/// # Examples
///
/// ```
/// use prompt_schema::{PromptTemplate, StringPromptTemplate, Variables};
///
/// let template = StringPromptTemplate::from_template("You are {{role}}. {{task}}").unwrap();
/// let template = template.partial([("role", "a helpful assistant")]).unwrap();
///
/// let mut variables = Variables::new();
/// variables.insert("task".to_owned(), "Answer concisely.".into());
///
/// let rendered = template.format(&variables).unwrap();
/// assert_eq!(rendered, "You are a helpful assistant. Answer concisely.");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StringPromptTemplate {
    #[serde(flatten)]
    base: TemplateBase,
    template: String,
}

impl StringPromptTemplate {
    /// Creates a template whose input variables are inferred from its placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] if a placeholder is named `stop`.
    pub fn from_template(template: impl Into<String>) -> PromptResult<Self> {
        Self::builder(template).build()
    }

    /// Returns a builder for constructing templates.
    #[must_use]
    pub fn builder(template: impl Into<String>) -> StringTemplateBuilder {
        StringTemplateBuilder::new(template)
    }

    /// Returns the raw template string.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl PromptTemplate for StringPromptTemplate {
    fn base(&self) -> &TemplateBase {
        &self.base
    }

    fn with_base(&self, base: TemplateBase) -> Self {
        Self {
            base,
            template: self.template.clone(),
        }
    }

    fn prompt_type(&self) -> &'static str {
        "prompt"
    }

    fn format(&self, variables: &Variables) -> PromptResult<String> {
        let prepared = self.prepare_variables(variables);
        render(&self.template, &prepared)
    }

    fn format_prompt(&self, variables: &Variables) -> PromptResult<PromptValue> {
        self.format(variables).map(PromptValue::Text)
    }
}

impl fmt::Display for StringPromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template)
    }
}

/// Builder for [`StringPromptTemplate`].
pub struct StringTemplateBuilder {
    template: String,
    input_variables: Option<Vec<String>>,
    partial_variables: IndexMap<String, PartialValue>,
    formatters: Option<Arc<FormatterRegistry>>,
    output_parser: Option<Arc<dyn OutputParser>>,
}

impl StringTemplateBuilder {
    /// Creates a new builder with the supplied template text.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            input_variables: None,
            partial_variables: IndexMap::new(),
            formatters: None,
            output_parser: None,
        }
    }

    /// Declares a required variable, disabling placeholder inference.
    #[must_use]
    pub fn with_input_variable(mut self, name: impl Into<String>) -> Self {
        self.input_variables
            .get_or_insert_with(Vec::new)
            .push(name.into());
        self
    }

    /// Binds a partial variable (a default filled in at format time).
    #[must_use]
    pub fn with_partial_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<PartialValue>,
    ) -> Self {
        self.partial_variables.insert(name.into(), value.into());
        self
    }

    /// Replaces the default formatter registry.
    #[must_use]
    pub fn with_formatters(mut self, formatters: Arc<FormatterRegistry>) -> Self {
        self.formatters = Some(formatters);
        self
    }

    /// Associates an output parser.
    #[must_use]
    pub fn with_output_parser(mut self, parser: Arc<dyn OutputParser>) -> Self {
        self.output_parser = Some(parser);
        self
    }

    /// Builds the template.
    ///
    /// Without explicit input variables, every placeholder that is not bound
    /// as a partial variable becomes an input variable.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] if the variables are invalid.
    pub fn build(self) -> PromptResult<StringPromptTemplate> {
        let input_variables = self.input_variables.unwrap_or_else(|| {
            extract_variable_refs(&self.template)
                .into_iter()
                .filter(|name| !self.partial_variables.contains_key(name))
                .collect()
        });

        let mut base = TemplateBase::builder().input_variables(input_variables);
        for (name, value) in self.partial_variables {
            base = base.partial_variable(name, value);
        }
        if let Some(formatters) = self.formatters {
            base = base.formatters(formatters);
        }
        if let Some(parser) = self.output_parser {
            base = base.output_parser(parser);
        }

        Ok(StringPromptTemplate {
            base: base.build()?,
            template: self.template,
        })
    }
}

/// Substitutes every `{{name}}` placeholder with the display form of its value.
pub(crate) fn render(template: &str, values: &Variables) -> PromptResult<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            output.push_str(&rest[open..]);
            return Ok(output);
        };

        let name = after_open[..close].trim();
        if name.is_empty() {
            output.push_str(&rest[open..open + 2 + close + 2]);
        } else {
            let value = values.get(name).ok_or_else(|| PromptError::MissingVariable {
                name: name.to_owned(),
            })?;
            output.push_str(&value.to_string());
        }
        rest = &after_open[close + 2..];
    }

    output.push_str(rest);
    Ok(output)
}

/// Extracts placeholder names in order of first appearance.
pub(crate) fn extract_variable_refs(template: &str) -> Vec<String> {
    let mut vars: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let name = after_open[..close].trim();
        if !name.is_empty() && !vars.iter().any(|existing| existing == name) {
            vars.push(name.to_owned());
        }
        rest = &after_open[close + 2..];
    }

    vars
}
