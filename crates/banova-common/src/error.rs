//! Error types for banova.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Contrast Error
//!   Reason: contrast 'FT1vFT2' has 3 weights but factor x2 needs 2
//!   Fix: Give the contrast exactly one weight per level of the factor it targets.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 41,
//!   "category": "contrast",
//!   "message": "contrast 'FT1vFT2' has 3 weights but factor x2 needs 2",
//!   "recoverable": true,
//!   "suggested_action": "fix_input",
//!   "context": { "contrast": "FT1vFT2", "expected": 2, "actual": 3 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for banova operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration errors (chain settings, config files).
    Config,
    /// Input data errors (response values, level indices, sources).
    Data,
    /// Model construction errors (shape declarations, hyper constants).
    Model,
    /// Sampler failures and cancellation.
    Sampling,
    /// Contrast registration and evaluation errors.
    Contrast,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Sampling => write!(f, "sampling"),
            ErrorCategory::Contrast => write!(f, "contrast"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Correct the input data or contrast definitions.
    FixInput,
    /// Correct the run configuration.
    FixConfig,
    /// Retry, possibly with a different seed or longer chain.
    Retry,
    /// Abort the operation.
    Abort,
    /// Manual intervention required.
    ManualIntervention,
    /// No action needed (informational).
    None,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::FixConfig => write!(f, "fix_config"),
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::Abort => write!(f, "abort"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
            SuggestedAction::None => write!(f, "none"),
        }
    }
}

/// Unified error type for banova.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value for {field}: {message}")]
    InvalidConfigValue { field: String, message: String },

    // Data errors (20-29)
    #[error("data validation failed: {0}")]
    DataValidation(String),

    #[error(
        "observation {observation}: level index {index} out of range for {factor} ({levels} levels)"
    )]
    LevelOutOfRange {
        factor: String,
        observation: usize,
        index: usize,
        levels: usize,
    },

    #[error("unknown data source: {0}")]
    UnknownSource(String),

    #[error("data source {0} is not yet implemented")]
    UnsupportedSource(String),

    // Model errors (30-34)
    #[error("model construction failed: {0}")]
    ModelConstruction(String),

    #[error("parameter {group} declared with shape {declared}, dataset requires {expected}")]
    ShapeMismatch {
        group: String,
        declared: String,
        expected: String,
    },

    // Sampling errors (35-39)
    #[error("sampling failed: {0}")]
    Sampling(String),

    #[error("sampling cancelled after {completed} of {requested} iterations")]
    Cancelled { completed: usize, requested: usize },

    // Contrast errors (40-49)
    #[error("contrast error: {0}")]
    Contrast(String),

    #[error("contrast '{name}' has {actual} weights but {target} needs {expected}")]
    ContrastDimension {
        name: String,
        target: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown contrast group: {0}")]
    UnknownContrastGroup(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Data errors
    /// - 30-34: Model errors
    /// - 35-39: Sampling errors
    /// - 40-49: Contrast errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfigValue { .. } => 11,
            Error::DataValidation(_) => 20,
            Error::LevelOutOfRange { .. } => 21,
            Error::UnknownSource(_) => 22,
            Error::UnsupportedSource(_) => 23,
            Error::ModelConstruction(_) => 30,
            Error::ShapeMismatch { .. } => 31,
            Error::Sampling(_) => 35,
            Error::Cancelled { .. } => 36,
            Error::Contrast(_) => 40,
            Error::ContrastDimension { .. } => 41,
            Error::UnknownContrastGroup(_) => 42,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfigValue { .. } => ErrorCategory::Config,

            Error::DataValidation(_)
            | Error::LevelOutOfRange { .. }
            | Error::UnknownSource(_)
            | Error::UnsupportedSource(_) => ErrorCategory::Data,

            Error::ModelConstruction(_) | Error::ShapeMismatch { .. } => ErrorCategory::Model,

            Error::Sampling(_) | Error::Cancelled { .. } => ErrorCategory::Sampling,

            Error::Contrast(_)
            | Error::ContrastDimension { .. }
            | Error::UnknownContrastGroup(_) => ErrorCategory::Contrast,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfigValue { .. } => true,

            Error::DataValidation(_) | Error::LevelOutOfRange { .. } => true,
            Error::UnknownSource(_) => true,
            // Waiting will not make an unimplemented source appear.
            Error::UnsupportedSource(_) => false,

            // Shape mismatches are programming errors in the model declaration.
            Error::ModelConstruction(_) | Error::ShapeMismatch { .. } => false,

            Error::Sampling(_) => true,
            Error::Cancelled { .. } => true,

            Error::Contrast(_) | Error::ContrastDimension { .. } => true,
            Error::UnknownContrastGroup(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) | Error::InvalidConfigValue { .. } => SuggestedAction::FixConfig,

            Error::DataValidation(_) | Error::LevelOutOfRange { .. } => SuggestedAction::FixInput,
            Error::UnknownSource(_) => SuggestedAction::FixInput,
            Error::UnsupportedSource(_) => SuggestedAction::Abort,

            Error::ModelConstruction(_) | Error::ShapeMismatch { .. } => {
                SuggestedAction::ManualIntervention
            }

            Error::Sampling(_) => SuggestedAction::Retry,
            Error::Cancelled { .. } => SuggestedAction::Retry,

            Error::Contrast(_)
            | Error::ContrastDimension { .. }
            | Error::UnknownContrastGroup(_) => SuggestedAction::FixInput,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::FixInput,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'banova config show' to inspect the resolved configuration."
            }
            Error::InvalidConfigValue { .. } => {
                "Require chain_length > burnin >= 0 and thin >= 1; scale_floor must be positive."
            }
            Error::DataValidation(_) => {
                "Check that the response has at least two distinct finite values and that all arrays have equal length."
            }
            Error::LevelOutOfRange { .. } => {
                "Level indices must be zero-based and smaller than the declared level count."
            }
            Error::UnknownSource(_) => "List available sources with 'banova sources'.",
            Error::UnsupportedSource(_) => {
                "This source is declared but has no loader yet. Supply the data with '--data' instead."
            }
            Error::ModelConstruction(_) | Error::ShapeMismatch { .. } => {
                "Internal model declaration problem. Report it with the dataset dimensions."
            }
            Error::Sampling(_) => {
                "Retry with a different '--seed' or a smaller initial proposal scale."
            }
            Error::Cancelled { .. } => "The run was interrupted. Re-run to obtain a complete chain.",
            Error::Contrast(_) | Error::ContrastDimension { .. } => {
                "Give the contrast exactly one weight per level of the factor it targets."
            }
            Error::UnknownContrastGroup(_) => "Contrast groups are 'x1', 'x2' and 'x1x2'.",
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON input. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidConfigValue { .. } => "Configuration Error",
            Error::DataValidation(_) => "Data Validation Error",
            Error::LevelOutOfRange { .. } => "Level Index Out of Range",
            Error::UnknownSource(_) => "Unknown Data Source",
            Error::UnsupportedSource(_) => "Data Source Not Implemented",
            Error::ModelConstruction(_) | Error::ShapeMismatch { .. } => "Model Construction Error",
            Error::Sampling(_) => "Sampling Error",
            Error::Cancelled { .. } => "Sampling Cancelled",
            Error::Contrast(_) | Error::ContrastDimension { .. } => "Contrast Error",
            Error::UnknownContrastGroup(_) => "Unknown Contrast Group",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidConfigValue { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::LevelOutOfRange {
                factor,
                observation,
                index,
                levels,
            } => {
                context.insert("factor".to_string(), serde_json::json!(factor));
                context.insert("observation".to_string(), serde_json::json!(observation));
                context.insert("index".to_string(), serde_json::json!(index));
                context.insert("levels".to_string(), serde_json::json!(levels));
            }
            Error::Cancelled {
                completed,
                requested,
            } => {
                context.insert("completed".to_string(), serde_json::json!(completed));
                context.insert("requested".to_string(), serde_json::json!(requested));
            }
            Error::ContrastDimension {
                name,
                expected,
                actual,
                ..
            } => {
                context.insert("contrast".to_string(), serde_json::json!(name));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation(),
    )
}
