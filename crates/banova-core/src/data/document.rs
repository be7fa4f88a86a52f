//! JSON data documents handed over by the table-loading layer.
//!
//! banova does not parse raw tables. Whatever reads the CSV (or database, or
//! spreadsheet) hands over one of these documents: the response column plus one
//! label column per factor.

use std::path::Path;

use banova_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::dataset::Dataset;

/// Column-oriented data document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DataDocument {
    /// Raw response values.
    pub response: Vec<f64>,
    /// Level label of factor 1 per observation.
    pub factor1: Vec<String>,
    /// Level label of factor 2 per observation.
    pub factor2: Vec<String>,
}

impl DataDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply `transform` to the response and code the labels into a dataset.
    pub fn into_dataset(self, transform: ResponseTransform) -> Result<Dataset> {
        let response = transform.apply_all(&self.response)?;
        Dataset::from_labels(&response, &self.factor1, &self.factor2)
    }
}

/// Transform applied to the raw response before standardization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTransform {
    #[default]
    Identity,
    /// Logit of a percentage: `y -> -ln(100/y - 1)`. Requires `0 < y < 100`.
    LogitPercent,
}

impl ResponseTransform {
    pub fn apply(self, value: f64) -> Result<f64> {
        match self {
            ResponseTransform::Identity => Ok(value),
            ResponseTransform::LogitPercent => {
                if !(value > 0.0 && value < 100.0) {
                    return Err(Error::DataValidation(format!(
                        "percentage {} is outside (0, 100) and has no logit",
                        value
                    )));
                }
                Ok(-(100.0 / value - 1.0).ln())
            }
        }
    }

    pub fn apply_all(self, values: &[f64]) -> Result<Vec<f64>> {
        values.iter().map(|v| self.apply(*v)).collect()
    }
}
