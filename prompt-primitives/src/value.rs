//! Dynamic values passed into prompt templates.
//!
//! Template variables may hold plain text, numbers, documents or nested
//! lists and maps. [`ValueKind`] tags each runtime shape and arranges the
//! tags in a small hierarchy so that formatters can be registered for a
//! whole family of kinds (e.g. every [`ValueKind::Number`]).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::document::Document;

/// Insertion-ordered map of named values.
pub type ValueMap = IndexMap<String, Value>;

/// A dynamically typed template value.
///
/// Deserialization follows [`From<serde_json::Value>`]: objects always become
/// [`Value::Map`], so a serialized [`Value::Document`] reads back as a map.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Plain text.
    Text(String),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// A document with page content and metadata.
    Document(Document),
    /// Insertion-ordered mapping of values.
    Map(ValueMap),
}

/// Runtime type tag of a [`Value`].
///
/// Kinds form a tree rooted at [`ValueKind::Any`]:
/// `Integer` and `Float` are `Number`s; `Null`, `Bool`, `Text` and `Number`
/// are `Scalar`s; `Document`, `List` and `Map` hang directly off `Any`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Root of the hierarchy; every value is-a `Any`.
    Any,
    /// Any non-container value.
    Scalar,
    /// Integers and floats.
    Number,
    /// [`Value::Null`].
    Null,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Integer`].
    Integer,
    /// [`Value::Float`].
    Float,
    /// [`Value::Text`].
    Text,
    /// [`Value::Document`].
    Document,
    /// [`Value::List`].
    List,
    /// [`Value::Map`].
    Map,
}

impl ValueKind {
    /// Returns the direct parent kind, or `None` for [`ValueKind::Any`].
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Any => None,
            Self::Scalar | Self::Document | Self::List | Self::Map => Some(Self::Any),
            Self::Number | Self::Null | Self::Bool | Self::Text => Some(Self::Scalar),
            Self::Integer | Self::Float => Some(Self::Number),
        }
    }

    /// Returns `true` when `self` equals `ancestor` or descends from it.
    #[must_use]
    pub fn is_a(self, ancestor: Self) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl Value {
    /// Returns the exact runtime kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
            Self::Document(_) => ValueKind::Document,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// Returns the inner text if this is a [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Integer(number) => write!(f, "{number}"),
            Self::Float(number) => match serde_json::Number::from_f64(*number) {
                Some(encoded) => write!(f, "{encoded}"),
                None => write!(f, "{number}"),
            },
            Self::Text(text) => f.write_str(text),
            Self::Document(document) => f.write_str(&document.page_content),
            Self::List(_) | Self::Map(_) => {
                let encoded = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&encoded)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Self::Document(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Self::Integer)
                .or_else(|| number.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}
