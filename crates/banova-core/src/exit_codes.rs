//! Exit codes for the banova CLI.
//!
//! Exit codes communicate the outcome of a run without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-6: Success/operational outcomes
//! - 10-19: User/input errors (recoverable by fixing the input or config)
//! - 20-29: Internal errors (numerical failures, I/O, bugs)

use banova_common::{Error, ErrorCategory};

/// Exit codes for banova operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Success / Operational Outcomes (0-6)
    // ========================================================================
    /// Success
    Clean = 0,

    /// Sampling cancelled or timed out; no result produced
    Interrupted = 6,

    // ========================================================================
    // User / Input Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Invalid configuration or chain settings
    ConfigError = 11,

    /// Dataset failed validation
    DataError = 12,

    /// Model could not be built from the declared shapes or constants
    ModelError = 13,

    /// Contrast failed registration or evaluation
    ContrastError = 14,

    /// Named data source has no implementation
    UnsupportedSource = 15,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// The sampler could not make progress
    SamplingError = 22,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Codes 0-6 describe workflow state, not failures of the input.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Interrupted => "ERR_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DataError => "ERR_DATA",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::ContrastError => "ERR_CONTRAST",
            ExitCode::UnsupportedSource => "ERR_UNSUPPORTED_SOURCE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::SamplingError => "ERR_SAMPLING",
        }
    }

    /// Exit code for a failed operation.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Cancelled { .. } => ExitCode::Interrupted,
            Error::UnsupportedSource(_) => ExitCode::UnsupportedSource,
            Error::Json(_) => ExitCode::DataError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Data => ExitCode::DataError,
                ErrorCategory::Model => ExitCode::ModelError,
                ErrorCategory::Contrast => ExitCode::ContrastError,
                ErrorCategory::Sampling => ExitCode::SamplingError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        ExitCode::from_error(err)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
