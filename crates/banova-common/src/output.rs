//! Output formats for CLI payloads.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON (default for machine consumption)
    #[default]
    Json,

    /// Human-readable Markdown tables
    Md,

    /// One line per summarized quantity
    Summary,
}

impl OutputFormat {
    /// Whether this format is meant to be parsed by a machine.
    pub fn is_machine(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde() {
        for format in [OutputFormat::Json, OutputFormat::Md, OutputFormat::Summary] {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format));
        }
    }

    #[test]
    fn only_json_is_machine() {
        assert!(OutputFormat::Json.is_machine());
        assert!(!OutputFormat::Md.is_machine());
        assert!(!OutputFormat::Summary.is_machine());
    }
}
