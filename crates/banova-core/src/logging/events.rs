//! Structured event definitions for logging.
//!
//! Every pipeline event is emitted with its event name as the tracing target and
//! inherits `run_id` and `stage` from the enclosing spans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Response standardization.
    Standardize,
    /// Model construction.
    Build,
    /// Mode search for the starting point.
    Optimize,
    /// Metropolis sampling.
    Sample,
    /// Burn-in, thinning, centering and rescaling.
    Process,
    /// Contrast evaluation.
    Contrast,
    /// Summaries and report rendering.
    Report,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Standardize => "standardize",
            Stage::Build => "build",
            Stage::Optimize => "optimize",
            Stage::Sample => "sample",
            Stage::Process => "process",
            Stage::Contrast => "contrast",
            Stage::Report => "report",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const STANDARDIZE_FINISHED: &str = "standardize.finished";
    pub const BUILD_FINISHED: &str = "build.finished";

    pub const OPTIMIZE_CONVERGED: &str = "optimize.converged";
    pub const OPTIMIZE_FALLBACK: &str = "optimize.fallback";

    pub const SAMPLE_STARTED: &str = "sample.started";
    pub const SAMPLE_PROGRESS: &str = "sample.progress";
    pub const SAMPLE_TUNED: &str = "sample.tuned";
    pub const SAMPLE_FINISHED: &str = "sample.finished";
    pub const SAMPLE_CANCELLED: &str = "sample.cancelled";

    pub const PROCESS_FINISHED: &str = "process.finished";
    pub const CONTRAST_EVALUATED: &str = "contrast.evaluated";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const REPORT_RENDERED: &str = "report.rendered";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// One JSONL line as written by [`super::JsonlLayer`].
///
/// `run_id` and `stage` are absent for events emitted outside a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,
    /// Event name (e.g., "run.started", "sample.progress").
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl LogEvent {
    pub fn new(level: Level, event: impl Into<String>) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: None,
            stage: None,
            message: None,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Correlation context for one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }

    /// Span carrying `run_id`; events inside it inherit the id.
    pub fn run_span(&self) -> tracing::Span {
        tracing::info_span!("run", run_id = %self.run_id)
    }

    /// Span carrying the pipeline stage.
    pub fn stage_span(&self, stage: Stage) -> tracing::Span {
        tracing::info_span!("stage", stage = stage.as_str())
    }
}
