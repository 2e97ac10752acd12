use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use prompt_kit::primitives::{Document, MessageRole, Value, ValueKind};
use prompt_kit::schema::{
    ChatPromptTemplate, Formatter, FormatterRegistry, LoadedPrompt, PartialValue, PromptError,
    PromptTemplate, PromptValue, RunConfig, StrOutputParser, StringPromptTemplate, Variables,
    format_document, load_prompt,
};
use serde_json::json;
use tempfile::tempdir;
use uuid::Uuid;

fn vars(entries: &[(&str, Value)]) -> Variables {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_owned(), value.clone()))
        .collect()
}

#[test]
fn retrieval_prompt_formats_documents_and_lazy_partials() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);

    let template = StringPromptTemplate::from_template(
        "[{{clock}}] Answer {{question}} using {{context}}",
    )
    .unwrap()
    .partial([(
        "clock",
        PartialValue::producer(move || {
            format!("t{}", counter.fetch_add(1, Ordering::SeqCst))
        }),
    )])
    .unwrap();

    assert_eq!(template.input_variables(), ["question", "context"]);

    let variables = vars(&[
        ("question", Value::from("why?")),
        (
            "context",
            Value::from(vec![Document::new("alpha"), Document::new("beta")]),
        ),
    ]);

    let first = template.format(&variables).unwrap();
    let second = template.format(&variables).unwrap();
    assert_eq!(first, r#"[t0] Answer why? using ["alpha","beta"]"#);
    assert_eq!(second, r#"[t1] Answer why? using ["alpha","beta"]"#);
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
}

#[test]
fn invoke_matches_format_prompt() {
    let template = ChatPromptTemplate::from_messages([
        (MessageRole::System, "You are {{persona}}."),
        (MessageRole::User, "{{question}}"),
    ])
    .unwrap();
    let variables = vars(&[
        ("persona", Value::from("terse")),
        ("question", Value::from("status?")),
    ]);
    let config = RunConfig::new()
        .with_run_id(Uuid::new_v4())
        .with_run_name("status-check")
        .with_tag("integration")
        .with_metadata("attempt", json!(1));

    let invoked = template.invoke(&variables, Some(&config)).unwrap();
    assert_eq!(invoked, template.format_prompt(&variables).unwrap());
    assert!(matches!(invoked, PromptValue::Chat(ref messages) if messages.len() == 2));

    let err = template
        .invoke(&vars(&[("persona", Value::from("terse"))]), None)
        .expect_err("should fail");
    assert!(matches!(err, PromptError::MissingVariable { .. }));
}

#[test]
fn custom_registry_flows_through_templates() {
    let registry = FormatterRegistry::with_defaults()
        .with_formatter(
            ValueKind::Number,
            Formatter::simple(|value| Value::Text(format!("{value} units"))),
        )
        .with_formatter(
            ValueKind::Map,
            Formatter::recursive(|value, format| match value {
                Value::Map(entries) => Value::Text(
                    entries
                        .iter()
                        .map(|(key, nested)| format!("{key}={}", format(nested)))
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                other => other.clone(),
            }),
        );

    let template = StringPromptTemplate::builder("Stock: {{stock}}")
        .with_formatters(Arc::new(registry))
        .build()
        .unwrap();

    let stock: Value = [("apples", Value::from(3)), ("pears", Value::from(1.5))]
        .into_iter()
        .collect();
    let rendered = template.format(&vars(&[("stock", stock)])).unwrap();
    assert_eq!(rendered, "Stock: apples=3 units, pears=1.5 units");
}

#[test]
fn format_document_uses_template_renderer() {
    let template = StringPromptTemplate::from_template("Page {{page}}: {{page_content}}").unwrap();
    let document = Document::new("This is a joke").with_metadata("page", "1");
    assert_eq!(
        format_document(&document, &template).unwrap(),
        "Page 1: This is a joke"
    );

    let needs_author =
        StringPromptTemplate::from_template("{{author}} wrote {{page_content}}").unwrap();
    let err = format_document(&document, &needs_author).expect_err("should fail");
    assert!(matches!(err, PromptError::Validation { .. }));
    assert!(err.to_string().contains("author"));
}

#[test]
fn saved_templates_reload_with_parser_association_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prompts/greeting.json");

    let template = StringPromptTemplate::builder("Hi {{name}}, {{ask}}")
        .with_output_parser(Arc::new(StrOutputParser))
        .build()
        .unwrap();
    template.save(&path).unwrap();

    let loaded = load_prompt(&path).unwrap();
    let LoadedPrompt::Text(ref reloaded) = loaded else {
        panic!("expected text template");
    };
    assert_eq!(reloaded.template(), template.template());
    assert_eq!(loaded.input_variables(), template.input_variables());
    assert!(loaded.output_parser().is_none());

    let variables = vars(&[("name", Value::from("Ada")), ("ask", Value::from("ready?"))]);
    assert_eq!(
        loaded.format(&variables).unwrap(),
        template.format(&variables).unwrap()
    );

    let partial = loaded.partial([("ask", "ready?")]).unwrap();
    let err = partial.save(dir.path().join("partial.yaml")).expect_err("should fail");
    assert!(matches!(err, PromptError::Validation { .. }));
}

#[test]
fn templates_are_shareable_across_threads() {
    let template = Arc::new(StringPromptTemplate::from_template("#{{n}}").unwrap());

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let template = Arc::clone(&template);
            thread::spawn(move || template.format(&vars(&[("n", Value::from(n))])).unwrap())
        })
        .collect();

    let mut rendered: Vec<String> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    rendered.sort();
    assert_eq!(rendered, vec!["#0", "#1", "#2", "#3"]);
}
