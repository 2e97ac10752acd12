//! Prompt template contract for LLM applications.
//!
//! A template turns named variables into a prompt. Before rendering, bound
//! partial variables are merged with the supplied ones and every value is
//! passed through a kind-dispatched [`FormatterRegistry`], so documents,
//! lists and maps arrive at the renderer already reduced to text-friendly
//! values.

#![warn(missing_docs, clippy::pedantic)]

mod base;
mod chat;
mod document;
mod error;
mod formatter;
mod parser;
mod partial;
mod persist;
mod run;
mod string;
mod template;

pub use base::{STOP_VARIABLE, TemplateBase, TemplateBaseBuilder, Variables};
pub use chat::{ChatPromptTemplate, MessageTemplate};
pub use document::{PAGE_CONTENT_VARIABLE, format_document};
pub use error::{PromptError, PromptResult};
pub use formatter::{Formatter, FormatterRegistry, PROMPT_DEFAULT_FORMATTERS, RecurseFn};
pub use parser::{OutputParser, StrOutputParser};
pub use partial::PartialValue;
pub use persist::{LoadedPrompt, load_prompt};
pub use run::RunConfig;
pub use string::{StringPromptTemplate, StringTemplateBuilder};
pub use template::{PromptTemplate, PromptValue};
