//! JSON Schema generation for input documents and report types.
//!
//! ```bash
//! # List available schema types
//! banova schema --list
//!
//! # Generate schema for a specific type
//! banova schema AnalysisReport
//! banova schema ContrastDocument
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::config::{ConfigSnapshot, RunConfig, SourceInfo};
pub use crate::contrast::{ContrastDocument, ContrastDraws};
pub use crate::data::DataDocument;
pub use crate::posterior::PosteriorSample;
pub use crate::report::{AnalysisReport, SamplerDiagnostics};
pub use crate::summary::{EffectSummaries, PosteriorSummary};

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Inputs
        ("DataDocument", "Response values with one label column per factor"),
        ("ContrastDocument", "Named contrasts grouped by x1, x2 and x1x2"),
        ("RunConfig", "Chain, prior and summary settings"),
        // Outputs
        ("AnalysisReport", "Complete result of one run"),
        ("ConfigSnapshot", "Resolved configuration with source path and hash"),
        ("SamplerDiagnostics", "Start point, acceptance and proposal scales"),
        ("EffectSummaries", "Summaries of baseline, sigma and every effect cell"),
        ("PosteriorSummary", "Mean, median, sd and HDI of one quantity"),
        ("ContrastDraws", "Posterior draws of one contrast"),
        ("PosteriorSample", "One retained draw on both scales"),
        ("SourceInfo", "Named data source and its preset contrasts"),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns None if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "DataDocument" => schema_for!(DataDocument),
        "ContrastDocument" => schema_for!(ContrastDocument),
        "RunConfig" => schema_for!(RunConfig),
        "AnalysisReport" => schema_for!(AnalysisReport),
        "ConfigSnapshot" => schema_for!(ConfigSnapshot),
        "SamplerDiagnostics" => schema_for!(SamplerDiagnostics),
        "EffectSummaries" => schema_for!(EffectSummaries),
        "PosteriorSummary" => schema_for!(PosteriorSummary),
        "ContrastDraws" => schema_for!(ContrastDraws),
        "PosteriorSample" => schema_for!(PosteriorSample),
        "SourceInfo" => schema_for!(SourceInfo),
        _ => return None,
    };

    serde_json::to_value(schema).ok()
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}
