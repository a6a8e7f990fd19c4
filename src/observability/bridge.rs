//! `tracing` integration.
//!
//! Dependencies such as hyper and tower-http report through `tracing`.
//! [`LoggerLayer`] forwards those events into a [`Logger`] so they share
//! its threshold, format and sink.

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::observability::level::Severity;
use crate::observability::logging::Logger;
use crate::observability::record::{Caller, Fields};

/// `tracing_subscriber` layer writing every event through a [`Logger`].
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

fn severity_of(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warn,
        Level::INFO => Severity::Info,
        _ => Severity::Debug,
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let severity = severity_of(meta.level());
        if !self.logger.enabled(severity) {
            return;
        }

        let mut fields = Fields::new();
        let mut message = None;
        event.record(&mut FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        });
        fields.insert("target".to_string(), Value::from(meta.target()));

        let caller = Caller::new(meta.file().unwrap_or_default(), meta.line().unwrap_or_default(), "");
        self.logger.log_at(
            severity,
            message.as_deref().unwrap_or_default(),
            Some(fields),
            caller,
        );
    }
}

struct FieldVisitor<'a> {
    fields: &'a mut Fields,
    message: &'a mut Option<String>,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.insert(field.name().to_string(), Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(rendered);
        } else {
            self.fields.insert(field.name().to_string(), Value::from(rendered));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::{LoggerConfig, SharedBuffer};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_events_reach_the_logger() {
        let buffer = SharedBuffer::new();
        let logger = LoggerConfig::builder()
            .level(Severity::Info)
            .sink(buffer.sink())
            .colorize(false)
            .show_caller(false)
            .into_logger();

        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("not written");
            tracing::warn!(path = "api.toml", attempts = 3u64, "Config reload failed");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" WARN Config reload failed"));
        assert!(lines[0].contains("attempts=3"));
        assert!(lines[0].contains("path=api.toml"));
        assert!(lines[0].contains("target=api_server::observability::bridge::tests"));
    }
}
