//! Document type consumed by document formatting helpers.

use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueMap};

/// A unit of text with attached metadata, e.g. a retrieved chunk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Primary text content of the document.
    pub page_content: String,
    /// Arbitrary metadata in insertion order.
    #[serde(default)]
    pub metadata: ValueMap,
}

impl Document {
    /// Creates a document with the supplied content and no metadata.
    #[must_use]
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: ValueMap::new(),
        }
    }

    /// Adds a metadata entry, replacing any previous value for `key`.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the page content.
    #[must_use]
    pub fn page_content(&self) -> &str {
        &self.page_content
    }

    /// Returns the metadata map.
    #[must_use]
    pub fn metadata(&self) -> &ValueMap {
        &self.metadata
    }
}
