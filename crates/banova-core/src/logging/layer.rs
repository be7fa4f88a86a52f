//! Custom tracing layer for JSONL output.
//!
//! Each event becomes one [`LogEvent`] line on stderr so stdout stays clean for
//! report payloads. `run_id` and `stage` are lifted from the enclosing spans.

use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::LogEvent;

/// `run_id` / `stage` recorded on a span, stored in its extensions.
#[derive(Debug, Clone, Default)]
struct RunFields {
    run_id: Option<String>,
    stage: Option<String>,
}

impl RunFields {
    fn set(&mut self, field: &Field, value: String) {
        match field.name() {
            "run_id" => self.run_id = Some(value),
            "stage" => self.stage = Some(value),
            _ => {}
        }
    }
}

impl Visit for RunFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.set(field, format!("{:?}", value));
    }
}

/// Writes event fields into a [`LogEvent`]; `message` goes to its own slot.
struct EventFields<'a>(&'a mut LogEvent);

impl EventFields<'_> {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.0.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.0.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for EventFields<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // Log densities may be -inf; JSON has no such number.
        let v = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field, v);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

/// JSONL tracing layer.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = RunFields::default();
        attrs.record(&mut fields);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(fields);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut line = LogEvent::new((*meta.level()).into(), meta.target());

        // Innermost span wins.
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(fields) = span.extensions().get::<RunFields>() {
                    if line.run_id.is_none() {
                        line.run_id.clone_from(&fields.run_id);
                    }
                    if line.stage.is_none() {
                        line.stage.clone_from(&fields.stage);
                    }
                }
            }
        }

        event.record(&mut EventFields(&mut line));

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line.to_jsonl());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    struct BufWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for BufWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture<F: FnOnce()>(f: F) -> Vec<serde_json::Value> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = JsonlLayer::new(BufWriter(buffer.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);

        let output = buffer.lock().unwrap();
        String::from_utf8_lossy(&output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn event_has_level_target_and_message() {
        let lines = capture(|| {
            tracing::warn!(target: "optimize.fallback", message = "fell back");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "warn");
        assert_eq!(lines[0]["event"], "optimize.fallback");
        assert_eq!(lines[0]["message"], "fell back");
        assert!(lines[0]["ts"].is_string());
    }

    #[test]
    fn fields_are_typed() {
        let lines = capture(|| {
            tracing::info!(target: "sample.progress", iteration = 42u64, acceptance = 0.25, tuned = true, "progress");
        });
        assert_eq!(lines[0]["fields"]["iteration"], 42);
        assert_eq!(lines[0]["fields"]["acceptance"], 0.25);
        assert_eq!(lines[0]["fields"]["tuned"], true);
        assert_eq!(lines[0]["message"], "progress");
    }

    #[test]
    fn non_finite_floats_are_strings() {
        let lines = capture(|| {
            tracing::info!(target: "sample.started", start_log_density = f64::NEG_INFINITY, "start");
        });
        assert_eq!(lines[0]["fields"]["start_log_density"], "-inf");
    }

    #[test]
    fn span_context_is_inherited() {
        let lines = capture(|| {
            let run = tracing::info_span!("run", run_id = "run-abc");
            let _run = run.enter();
            let stage = tracing::info_span!("stage", stage = "sample");
            let _stage = stage.enter();
            tracing::info!(target: "sample.finished", "done");
        });
        assert_eq!(lines[0]["run_id"], "run-abc");
        assert_eq!(lines[0]["stage"], "sample");
    }
}
