//! State shared by every prompt template kind.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use prompt_primitives::{Value, ValueMap};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::{PromptError, PromptResult};
use crate::formatter::{FormatterRegistry, PROMPT_DEFAULT_FORMATTERS};
use crate::parser::OutputParser;
use crate::partial::PartialValue;

/// Named variable values supplied to, or produced for, a template.
pub type Variables = ValueMap;

/// Variable name reserved for stop-sequence control.
pub const STOP_VARIABLE: &str = "stop";

/// Variables, partials, formatters and output parser of a template.
///
/// Every constructor, [`TemplateBase::partial`] and deserialization run the
/// same validation: `stop` is reserved, and input and partial variable names
/// must be disjoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTemplateBase")]
pub struct TemplateBase {
    #[serde(skip)]
    formatters: Arc<FormatterRegistry>,
    input_variables: Vec<String>,
    #[serde(serialize_with = "serialize_output_parser")]
    output_parser: Option<Arc<dyn OutputParser>>,
    partial_variables: IndexMap<String, PartialValue>,
}

impl TemplateBase {
    /// Creates a base with the supplied input variables and default formatters.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] if a variable is named `stop`.
    pub fn new<I, S>(input_variables: I) -> PromptResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().input_variables(input_variables).build()
    }

    /// Returns a builder for constructing template bases.
    #[must_use]
    pub fn builder() -> TemplateBaseBuilder {
        TemplateBaseBuilder::default()
    }

    /// Returns the formatter registry applied to variable values.
    #[must_use]
    pub fn formatters(&self) -> &Arc<FormatterRegistry> {
        &self.formatters
    }

    /// Returns the declared input variables in order.
    #[must_use]
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Returns the bound partial variables.
    #[must_use]
    pub fn partial_variables(&self) -> &IndexMap<String, PartialValue> {
        &self.partial_variables
    }

    /// Returns the associated output parser, if any.
    #[must_use]
    pub fn output_parser(&self) -> Option<&Arc<dyn OutputParser>> {
        self.output_parser.as_ref()
    }

    /// Merges resolved partial variables with `supplied` and formats every value.
    ///
    /// Supplied values win over partials of the same name. Producers run once
    /// per call. Presence of input variables is left to the renderer.
    #[must_use]
    pub fn prepare_variables(&self, supplied: &Variables) -> Variables {
        let mut merged: Variables = self
            .partial_variables
            .iter()
            .map(|(name, partial)| (name.clone(), Value::Text(partial.resolve())))
            .collect();
        for (name, value) in supplied {
            merged.insert(name.clone(), value.clone());
        }

        merged
            .into_iter()
            .map(|(name, value)| {
                let formatted = self.formatters.format_value(&value);
                (name, formatted)
            })
            .collect()
    }

    /// Derives a new base with `bindings` moved from inputs into partials.
    ///
    /// The receiver is left untouched. Bindings override existing partials.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] if the derived base binds `stop`.
    pub fn partial<I, K, V>(&self, bindings: I) -> PromptResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PartialValue>,
    {
        let mut partial_variables = self.partial_variables.clone();
        for (name, value) in bindings {
            partial_variables.insert(name.into(), value.into());
        }
        let input_variables: Vec<String> = self
            .input_variables
            .iter()
            .filter(|name| !partial_variables.contains_key(name.as_str()))
            .cloned()
            .collect();

        debug!(
            remaining = input_variables.len(),
            bound = partial_variables.len(),
            "derived partial template"
        );

        let derived = Self {
            formatters: Arc::clone(&self.formatters),
            input_variables,
            output_parser: self.output_parser.clone(),
            partial_variables,
        };
        derived.validate()?;
        Ok(derived)
    }

    /// Checks the reserved-name and disjointness rules.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] describing the first violated rule.
    pub fn validate(&self) -> PromptResult<()> {
        if self.input_variables.iter().any(|name| name == STOP_VARIABLE) {
            return Err(PromptError::validation(
                "cannot have an input variable named 'stop', as it is used internally, please rename",
            ));
        }
        if self.partial_variables.contains_key(STOP_VARIABLE) {
            return Err(PromptError::validation(
                "cannot have a partial variable named 'stop', as it is used internally, please rename",
            ));
        }

        let overlapping: Vec<&str> = self
            .input_variables
            .iter()
            .filter(|name| self.partial_variables.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !overlapping.is_empty() {
            return Err(PromptError::validation(format!(
                "found overlapping input and partial variables: {overlapping:?}"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for TemplateBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateBase")
            .field("formatters", &self.formatters.len())
            .field("input_variables", &self.input_variables)
            .field("partial_variables", &self.partial_variables)
            .field("output_parser", &self.output_parser)
            .finish()
    }
}

/// Builder for [`TemplateBase`].
#[derive(Default)]
pub struct TemplateBaseBuilder {
    formatters: Option<Arc<FormatterRegistry>>,
    input_variables: Vec<String>,
    partial_variables: IndexMap<String, PartialValue>,
    output_parser: Option<Arc<dyn OutputParser>>,
}

impl TemplateBaseBuilder {
    /// Declares a required input variable.
    #[must_use]
    pub fn input_variable(mut self, name: impl Into<String>) -> Self {
        self.input_variables.push(name.into());
        self
    }

    /// Declares several required input variables.
    #[must_use]
    pub fn input_variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_variables.extend(names.into_iter().map(Into::into));
        self
    }

    /// Binds a partial variable.
    #[must_use]
    pub fn partial_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<PartialValue>,
    ) -> Self {
        self.partial_variables.insert(name.into(), value.into());
        self
    }

    /// Replaces the default formatter registry.
    #[must_use]
    pub fn formatters(mut self, formatters: Arc<FormatterRegistry>) -> Self {
        self.formatters = Some(formatters);
        self
    }

    /// Associates an output parser.
    #[must_use]
    pub fn output_parser(mut self, parser: Arc<dyn OutputParser>) -> Self {
        self.output_parser = Some(parser);
        self
    }

    /// Builds and validates the base.
    ///
    /// Duplicate input variables collapse to their first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Validation`] when `stop` is used or input and
    /// partial variable names overlap.
    pub fn build(self) -> PromptResult<TemplateBase> {
        let mut input_variables: Vec<String> = Vec::with_capacity(self.input_variables.len());
        for name in self.input_variables {
            if !input_variables.contains(&name) {
                input_variables.push(name);
            }
        }

        let base = TemplateBase {
            formatters: self
                .formatters
                .unwrap_or_else(|| Arc::clone(&PROMPT_DEFAULT_FORMATTERS)),
            input_variables,
            output_parser: self.output_parser,
            partial_variables: self.partial_variables,
        };
        base.validate()?;
        Ok(base)
    }
}

#[derive(Deserialize)]
struct RawTemplateBase {
    #[serde(default)]
    input_variables: Vec<String>,
    #[serde(default)]
    partial_variables: IndexMap<String, PartialValue>,
}

impl TryFrom<RawTemplateBase> for TemplateBase {
    type Error = PromptError;

    fn try_from(raw: RawTemplateBase) -> PromptResult<Self> {
        let mut builder = TemplateBase::builder().input_variables(raw.input_variables);
        for (name, value) in raw.partial_variables {
            builder = builder.partial_variable(name, value);
        }
        builder.build()
    }
}

#[allow(clippy::ref_option)]
fn serialize_output_parser<S: Serializer>(
    parser: &Option<Arc<dyn OutputParser>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match parser {
        Some(parser) => {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("_type", parser.parser_type())?;
            map.end()
        }
        None => serializer.serialize_none(),
    }
}
