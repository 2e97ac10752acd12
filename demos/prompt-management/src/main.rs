//! Example demonstrating formatters, partial variables, and template persistence.

use std::env;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use prompt_kit::primitives::{Document, MessageRole, Value, ValueKind};
use prompt_kit::schema::{
    ChatPromptTemplate, Formatter, FormatterRegistry, PartialValue, PromptTemplate, RunConfig,
    StringPromptTemplate, Variables, format_document, load_prompt,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    println!("=== Prompt Kit: Prompt Management Example ===\n");

    // Example 1: Formatting structured values
    demonstrate_formatters()?;

    // Example 2: Partial variables
    demonstrate_partials()?;

    // Example 3: Documents and chat prompts
    demonstrate_documents_and_chat()?;

    // Example 4: Saving and loading
    demonstrate_persistence()?;

    Ok(())
}

fn demonstrate_formatters() -> Result<()> {
    println!("--- Example 1: Value Formatters ---\n");

    let template = StringPromptTemplate::from_template(
        "Answer {{question}} using these notes: {{notes}}",
    )?;

    let mut variables = Variables::new();
    variables.insert("question".to_owned(), "what changed?".into());
    variables.insert(
        "notes".to_owned(),
        Value::from(vec![
            Document::new("Scheduler now retries heartbeats."),
            Document::new("Journal files rotate daily."),
        ]),
    );
    println!("Default formatters:\n{}\n", template.format(&variables)?);

    let registry = FormatterRegistry::with_defaults().with_formatter(
        ValueKind::List,
        Formatter::recursive(|value, format| match value {
            Value::List(items) => Value::Text(
                items
                    .iter()
                    .map(|item| format!("\n  - {}", format(item)))
                    .collect(),
            ),
            other => other.clone(),
        }),
    );
    let bulleted = StringPromptTemplate::builder(template.template())
        .with_formatters(Arc::new(registry))
        .build()?;
    println!("Bulleted list formatter:\n{}\n", bulleted.format(&variables)?);

    Ok(())
}

fn demonstrate_partials() -> Result<()> {
    println!("--- Example 2: Partial Variables ---\n");

    let template =
        StringPromptTemplate::from_template("[{{timestamp}}] You are {{role}}. {{task}}")?;
    let partial = template.partial([
        ("role", PartialValue::from("a code reviewer")),
        (
            "timestamp",
            PartialValue::producer(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|elapsed| elapsed.as_secs().to_string())
                    .unwrap_or_default()
            }),
        ),
    ])?;

    println!("Original inputs: {:?}", template.input_variables());
    println!("Partial inputs:  {:?}", partial.input_variables());

    let mut variables = Variables::new();
    variables.insert("task".to_owned(), "Review the scheduler module.".into());
    let config = RunConfig::new().with_run_name("review-prompt").with_tag("demo");
    let prompt = partial.invoke(&variables, Some(&config))?;
    println!("Rendered: {}\n", prompt.to_text());

    Ok(())
}

fn demonstrate_documents_and_chat() -> Result<()> {
    println!("--- Example 3: Documents and Chat Prompts ---\n");

    let document_template =
        StringPromptTemplate::from_template("Source {{source}} (page {{page}}): {{page_content}}")?;
    let document = Document::new("Partial templates cannot be saved.")
        .with_metadata("source", "guide.md")
        .with_metadata("page", 4);
    let summary = format_document(&document, &document_template)?;
    println!("Document: {summary}");

    let chat = ChatPromptTemplate::from_messages([
        (MessageRole::System, "You summarise project notes for {{audience}}."),
        (MessageRole::User, "{{summary}}"),
    ])?;
    let mut variables = Variables::new();
    variables.insert("audience".to_owned(), "new contributors".into());
    variables.insert("summary".to_owned(), summary.into());

    for message in chat.format_prompt(&variables)?.to_messages() {
        println!("  {message}");
    }
    println!();

    Ok(())
}

fn demonstrate_persistence() -> Result<()> {
    println!("--- Example 4: Saving and Loading ---\n");

    let directory = env::temp_dir().join("prompt-kit-demo");
    let template = StringPromptTemplate::from_template("Translate {{text}} into {{language}}.")?;

    for name in ["translate.json", "translate.yaml"] {
        let path = directory.join(name);
        template.save(&path)?;
        let loaded = load_prompt(&path)?;
        info!(path = %path.display(), inputs = ?loaded.input_variables(), "reloaded template");
    }

    match template.partial([("language", "French")])?.save(directory.join("partial.json")) {
        Ok(()) => println!("Unexpectedly saved a partial template"),
        Err(err) => println!("Saving a partial template fails: {err}"),
    }

    Ok(())
}
