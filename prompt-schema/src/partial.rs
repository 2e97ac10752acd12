//! Partial variables bound ahead of formatting.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

type ProducerFn = dyn Fn() -> String + Send + Sync;

/// A pre-bound template variable.
///
/// Producers are invoked every time the owning template prepares its
/// variables; their results are never cached.
#[derive(Clone)]
pub enum PartialValue {
    /// A fixed string.
    Literal(String),
    /// A zero-argument function evaluated at format time.
    Producer(Arc<ProducerFn>),
}

impl PartialValue {
    /// Wraps a zero-argument producer.
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(f))
    }

    /// Returns the bound string, invoking the producer if necessary.
    #[must_use]
    pub fn resolve(&self) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Producer(produce) => produce(),
        }
    }
}

impl fmt::Debug for PartialValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<&str> for PartialValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<String> for PartialValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl Serialize for PartialValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(text) => serializer.serialize_str(text),
            Self::Producer(_) => Err(serde::ser::Error::custom(
                "partial variable producers cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for PartialValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Literal)
    }
}
