//! banova common types and errors.
//!
//! This crate provides foundational types shared across banova crates:
//! - The unified error taxonomy with stable codes
//! - Output formats
//! - Report schema versioning

pub mod error;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError, SuggestedAction};
pub use output::OutputFormat;

/// Schema version stamped on every analysis report.
pub const SCHEMA_VERSION: &str = "1.0.0";
