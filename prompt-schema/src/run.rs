//! Run configuration for invoking templates as pipeline steps.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::error::PromptResult;

/// Metadata attached to a single invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    metadata: IndexMap<String, serde_json::Value>,
}

impl RunConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the run identifier instead of generating one per call.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Sets a human-readable run name.
    #[must_use]
    pub fn with_run_name(mut self, name: impl Into<String>) -> Self {
        self.run_name = Some(name.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the pinned run identifier, if any.
    #[must_use]
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Returns the run name, if any.
    #[must_use]
    pub fn run_name(&self) -> Option<&str> {
        self.run_name.as_deref()
    }

    /// Returns the configured tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the configured metadata.
    #[must_use]
    pub fn metadata(&self) -> &IndexMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// Runs `f` inside a span describing the run.
///
/// Runs without a pinned id get a fresh v4 id. Metadata is recorded as JSON
/// on the `run started` event.
pub(crate) fn call_with_config<T, F>(
    config: Option<&RunConfig>,
    run_type: &'static str,
    f: F,
) -> PromptResult<T>
where
    F: FnOnce() -> PromptResult<T>,
{
    let run_id = config
        .and_then(RunConfig::run_id)
        .unwrap_or_else(Uuid::new_v4);
    let run_name = config.and_then(RunConfig::run_name).unwrap_or(run_type);
    let tags = config.map(RunConfig::tags).unwrap_or_default();
    let metadata = config
        .map(|config| serde_json::to_string(config.metadata()).unwrap_or_default())
        .unwrap_or_default();

    let span = info_span!("run", run_type, %run_id, run_name, ?tags);
    let _guard = span.enter();

    debug!(%metadata, "run started");
    let result = f();
    match &result {
        Ok(_) => debug!("run finished"),
        Err(err) => warn!(?err, "run failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;
    use crate::error::PromptError;

    /// Collects `name=value` pairs from every event.
    #[derive(Clone, Default)]
    struct FieldCapture(Arc<Mutex<Vec<String>>>);

    impl FieldCapture {
        fn fields(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl<S: Subscriber> Layer<S> for FieldCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            event.record(&mut FieldVisitor(&self.0));
        }
    }

    struct FieldVisitor<'a>(&'a Mutex<Vec<String>>);

    impl Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{}={value:?}", field.name()));
        }
    }

    #[test]
    fn builder_sets_fields() {
        let id = Uuid::new_v4();
        let config = RunConfig::new()
            .with_run_id(id)
            .with_run_name("summarize")
            .with_tag("batch")
            .with_metadata("user", json!("u-1"));

        assert_eq!(config.run_id(), Some(id));
        assert_eq!(config.run_name(), Some("summarize"));
        assert_eq!(config.tags(), ["batch"]);
        assert_eq!(config.metadata()["user"], json!("u-1"));
    }

    #[test]
    fn call_with_config_returns_inner_result() {
        let ok = call_with_config(None, "prompt", || Ok(3)).unwrap();
        assert_eq!(ok, 3);

        let err = call_with_config::<(), _>(Some(&RunConfig::new()), "prompt", || {
            Err(PromptError::validation("bad input"))
        })
        .expect_err("should fail");
        assert!(matches!(err, PromptError::Validation { .. }));
    }

    #[test]
    fn call_with_config_records_metadata() {
        let capture = FieldCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let config = RunConfig::new()
            .with_run_name("summarize")
            .with_metadata("attempt", json!(2))
            .with_metadata("user", json!("u-1"));

        let value = tracing::subscriber::with_default(subscriber, || {
            call_with_config(Some(&config), "prompt", || Ok("done"))
        })
        .unwrap();

        assert_eq!(value, "done");
        let fields = capture.fields();
        assert!(
            fields.contains(&r#"metadata={"attempt":2,"user":"u-1"}"#.to_owned()),
            "{fields:?}"
        );
    }
}
