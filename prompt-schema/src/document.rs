//! Formatting documents through prompt templates.

use prompt_primitives::{Document, Value};

use crate::base::Variables;
use crate::error::{PromptError, PromptResult};
use crate::template::PromptTemplate;

/// Variable name under which a document's page content is exposed.
pub const PAGE_CONTENT_VARIABLE: &str = "page_content";

/// Formats `document` into a string using `template`.
///
/// The page content is exposed as `page_content` and every metadata entry
/// under its own key; metadata wins if it also defines `page_content`.
/// Exactly the template's input variables are passed to
/// [`PromptTemplate::format`], in declared order.
///
/// # Examples
///
/// ```
/// use prompt_primitives::Document;
/// use prompt_schema::{format_document, StringPromptTemplate};
///
/// let document = Document::new("This is a joke").with_metadata("page", "1");
/// let template = StringPromptTemplate::from_template("Page {{page}}: {{page_content}}").unwrap();
///
/// assert_eq!(format_document(&document, &template).unwrap(), "Page 1: This is a joke");
/// ```
///
/// # Errors
///
/// Returns [`PromptError::Validation`] when the template needs variables the
/// document does not provide, and propagates formatting errors.
pub fn format_document<T>(document: &Document, template: &T) -> PromptResult<String>
where
    T: PromptTemplate + ?Sized,
{
    let mut available = Variables::with_capacity(document.metadata.len() + 1);
    available.insert(
        PAGE_CONTENT_VARIABLE.to_owned(),
        Value::Text(document.page_content.clone()),
    );
    for (key, value) in &document.metadata {
        available.insert(key.clone(), value.clone());
    }

    let input_variables = template.input_variables();
    let missing: Vec<&str> = input_variables
        .iter()
        .filter(|name| !available.contains_key(name.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        let required: Vec<&str> = input_variables
            .iter()
            .map(String::as_str)
            .filter(|name| *name != PAGE_CONTENT_VARIABLE)
            .collect();
        return Err(PromptError::validation(format!(
            "document prompt requires documents to have metadata variables: {required:?}. \
             Received document with missing metadata: {missing:?}"
        )));
    }

    let selected: Variables = input_variables
        .iter()
        .filter_map(|name| {
            available
                .get(name.as_str())
                .map(|value| (name.clone(), value.clone()))
        })
        .collect();
    template.format(&selected)
}
