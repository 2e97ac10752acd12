//! Kind-dispatched value formatters.
//!
//! A [`FormatterRegistry`] maps [`ValueKind`]s to [`Formatter`]s. Lookup
//! prefers an entry registered for the value's exact kind, then falls back to
//! the first registered ancestor kind in insertion order. Values without a
//! matching entry pass through unchanged.

use std::fmt;
use std::sync::{Arc, LazyLock};

use prompt_primitives::{Value, ValueKind};

/// Callback handed to [`Formatter::Recursive`] for formatting nested values.
pub type RecurseFn<'a> = &'a dyn Fn(&Value) -> Value;

type SimpleFn = dyn Fn(&Value) -> Value + Send + Sync;
type RecursiveFn = dyn Fn(&Value, &dyn Fn(&Value) -> Value) -> Value + Send + Sync;

/// Registry installed on templates that do not supply their own.
///
/// Documents reduce to their page content, lists format each element and
/// maps format each value.
pub static PROMPT_DEFAULT_FORMATTERS: LazyLock<Arc<FormatterRegistry>> =
    LazyLock::new(|| Arc::new(FormatterRegistry::with_defaults()));

/// A function converting a value into its formatted representation.
#[derive(Clone)]
pub enum Formatter {
    /// Formats a value on its own.
    Simple(Arc<SimpleFn>),
    /// Formats a value and may format nested values through the registry.
    Recursive(Arc<RecursiveFn>),
}

impl Formatter {
    /// Wraps a single-argument formatting function.
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::Simple(Arc::new(f))
    }

    /// Wraps a formatting function that receives a recursion callback.
    pub fn recursive<F>(f: F) -> Self
    where
        F: Fn(&Value, &dyn Fn(&Value) -> Value) -> Value + Send + Sync + 'static,
    {
        Self::Recursive(Arc::new(f))
    }

    fn apply(&self, registry: &FormatterRegistry, value: &Value) -> Value {
        match self {
            Self::Simple(f) => f(value),
            Self::Recursive(f) => f(value, &|nested: &Value| registry.format_value(nested)),
        }
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple(_) => "Formatter::Simple",
            Self::Recursive(_) => "Formatter::Recursive",
        })
    }
}

/// Insertion-ordered mapping from value kinds to formatters.
#[derive(Clone, Debug, Default)]
pub struct FormatterRegistry {
    entries: Vec<(ValueKind, Formatter)>,
}

impl FormatterRegistry {
    /// Creates an empty registry; every value passes through unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the default document, list and map formatters.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .with_formatter(ValueKind::Document, Formatter::simple(document_content))
            .with_formatter(ValueKind::List, Formatter::recursive(format_list))
            .with_formatter(ValueKind::Map, Formatter::recursive(format_map))
    }

    /// Registers a formatter, returning the updated registry.
    #[must_use]
    pub fn with_formatter(mut self, kind: ValueKind, formatter: Formatter) -> Self {
        self.insert(kind, formatter);
        self
    }

    /// Registers a formatter for `kind`.
    ///
    /// Re-registering a kind replaces its formatter but keeps its position.
    pub fn insert(&mut self, kind: ValueKind, formatter: Formatter) {
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == kind) {
            slot.1 = formatter;
        } else {
            self.entries.push((kind, formatter));
        }
    }

    /// Returns the formatter that applies to values of `kind`, if any.
    #[must_use]
    pub fn resolve(&self, kind: ValueKind) -> Option<&Formatter> {
        self.entries
            .iter()
            .find(|(registered, _)| *registered == kind)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(registered, _)| kind.is_a(*registered))
            })
            .map(|(_, formatter)| formatter)
    }

    /// Formats `value` with the most specific registered formatter.
    #[must_use]
    pub fn format_value(&self, value: &Value) -> Value {
        match self.resolve(value.kind()) {
            Some(formatter) => formatter.apply(self, value),
            None => value.clone(),
        }
    }

    /// Returns the registered kinds in insertion order.
    pub fn kinds(&self) -> impl Iterator<Item = ValueKind> + '_ {
        self.entries.iter().map(|(kind, _)| *kind)
    }

    /// Returns the number of registered formatters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no formatter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn document_content(value: &Value) -> Value {
    match value {
        Value::Document(document) => Value::Text(document.page_content.clone()),
        other => other.clone(),
    }
}

fn format_list(value: &Value, format: RecurseFn<'_>) -> Value {
    match value {
        Value::List(items) => Value::List(items.iter().map(format).collect()),
        other => other.clone(),
    }
}

fn format_map(value: &Value, format: RecurseFn<'_>) -> Value {
    match value {
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(key, nested)| (key.clone(), format(nested)))
                .collect(),
        ),
        other => other.clone(),
    }
}
