//! JSON log lines with structured record values.
//!
//! `tracing` can only carry primitive field values, so decision records pass
//! their JSON `value` as text. This layer parses that text back, so each line
//! carries the value as a nested object:
//!
//! ```text
//! {"timestamp":"2024-06-15T10:00:00.000Z","level":"INFO","target":"backup_events::observability::records","entry_type":"AWS_RESPONSE","value":{"ResponseMetadata":{"HTTPStatusCode":200},"CopyJobId":"copy-1"}}
//! ```

use std::{
    io::{self, Write},
    sync::Mutex,
};

use serde_json::{Map, Value};
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context};

/// Field whose text is parsed back into JSON.
const VALUE_FIELD: &str = "value";

/// Configuration for the JSON formatter.
#[derive(Debug, Clone, Copy)]
pub struct JsonRecordConfig {
    /// Include timestamps in output.
    pub include_timestamp: bool,
    /// Include source file and line.
    pub file_line: bool,
}

/// A tracing layer that writes one JSON object per event.
pub struct JsonRecordLayer<W: Write + Send + 'static> {
    config: JsonRecordConfig,
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> JsonRecordLayer<W> {
    pub fn new(config: JsonRecordConfig, writer: W) -> Self {
        Self {
            config,
            writer: Mutex::new(writer),
        }
    }
}

impl JsonRecordLayer<io::Stdout> {
    /// Create a layer that writes to stdout.
    pub fn stdout(config: JsonRecordConfig) -> Self {
        Self::new(config, io::stdout())
    }
}

impl<S, W> Layer<S> for JsonRecordLayer<W>
where
    S: Subscriber,
    W: Write + Send + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut line = Map::new();

        if self.config.include_timestamp {
            line.insert(
                "timestamp".to_string(),
                Value::String(
                    chrono::Utc::now()
                        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                        .to_string(),
                ),
            );
        }
        line.insert(
            "level".to_string(),
            Value::String(metadata.level().to_string()),
        );
        line.insert(
            "target".to_string(),
            Value::String(metadata.target().to_string()),
        );
        if self.config.file_line {
            if let Some(file) = metadata.file() {
                line.insert("file".to_string(), Value::String(file.to_string()));
            }
            if let Some(number) = metadata.line() {
                line.insert("line".to_string(), Value::from(number));
            }
        }

        let mut visitor = JsonFieldVisitor { fields: line };
        event.record(&mut visitor);

        let Ok(rendered) = serde_json::to_string(&visitor.fields) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", rendered);
        }
    }
}

/// Visitor that collects fields from a tracing event into a JSON object.
struct JsonFieldVisitor {
    fields: Map<String, Value>,
}

impl JsonFieldVisitor {
    fn insert_text(&mut self, field: &Field, text: String) {
        let value = if field.name() == VALUE_FIELD {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        } else {
            Value::String(text)
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonFieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert_text(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert_text(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert_text(field, value.to_string());
    }
}
