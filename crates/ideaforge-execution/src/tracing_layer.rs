//! Tracing layer that streams job lifecycle events to observers.
//!
//! Events logged under [`JOB_EVENT_TARGET`](crate::JOB_EVENT_TARGET) are
//! converted into [`JobEvent`]s and pushed onto a tokio channel; everything
//! else is ignored.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::JOB_EVENT_TARGET;

/// A job lifecycle event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobEvent {
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Structured fields such as `job_id`, `status` and `check`.
    pub fields: HashMap<String, Value>,
    pub timestamp: String,
}

impl JobEvent {
    /// The `job_id` field, if the event carried one.
    pub fn job_id(&self) -> Option<&str> {
        self.fields.get("job_id").and_then(Value::as_str)
    }
}

/// Forwards job events to an unbounded channel.
pub struct JobEventLayer {
    sender: mpsc::UnboundedSender<JobEvent>,
}

impl JobEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<JobEvent>) -> Self {
        Self { sender }
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for JobEventLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() != JOB_EVENT_TARGET {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let message = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let job_event = JobEvent {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // A dropped receiver just means nobody is listening any more
        let _ = self.sender.send(job_event);
    }
}

/// Field visitor that extracts tracing event fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_forwards_only_job_events() {
        let (layer, mut receiver) = JobEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: JOB_EVENT_TARGET, job_id = %"run_7", check = 3u32, "Polled job status");
            tracing::info!(target: "somewhere_else", "not a job event");
        });

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.message, "Polled job status");
        assert_eq!(event.level, "INFO");
        assert_eq!(event.job_id(), Some("run_7"));
        assert_eq!(event.fields.get("check"), Some(&serde_json::json!(3)));
        assert!(receiver.try_recv().is_err());
    }
}
