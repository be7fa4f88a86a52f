//! Two-factor dataset with validated level indices.

use banova_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The two crossed factors of the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Factor {
    #[serde(rename = "x1")]
    X1,
    #[serde(rename = "x2")]
    X2,
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Factor::X1 => write!(f, "x1"),
            Factor::X2 => write!(f, "x2"),
        }
    }
}

/// One response value with the level of each factor it was observed under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    pub value: f64,
    pub level1: usize,
    pub level2: usize,
}

/// An immutable two-factor dataset.
///
/// Every observation's level indices are checked against the level counts when the
/// dataset is built, so downstream code may index effect vectors without bounds
/// failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Dataset {
    observations: Vec<Observation>,
    levels1: usize,
    levels2: usize,
    names1: Option<Vec<String>>,
    names2: Option<Vec<String>>,
}

impl Dataset {
    /// Build a dataset from parallel arrays of values and zero-based level indices.
    pub fn new(
        values: &[f64],
        level1: &[usize],
        level2: &[usize],
        levels1: usize,
        levels2: usize,
    ) -> Result<Self> {
        if values.len() != level1.len() || values.len() != level2.len() {
            return Err(Error::DataValidation(format!(
                "parallel arrays differ in length: response={}, x1={}, x2={}",
                values.len(),
                level1.len(),
                level2.len()
            )));
        }
        if values.is_empty() {
            return Err(Error::DataValidation("dataset has no observations".into()));
        }
        if levels1 == 0 || levels2 == 0 {
            return Err(Error::DataValidation(format!(
                "level counts must be positive, got x1={}, x2={}",
                levels1, levels2
            )));
        }

        let mut observations = Vec::with_capacity(values.len());
        for (i, ((&value, &l1), &l2)) in values.iter().zip(level1).zip(level2).enumerate() {
            check_level(Factor::X1, i, l1, levels1)?;
            check_level(Factor::X2, i, l2, levels2)?;
            observations.push(Observation {
                value,
                level1: l1,
                level2: l2,
            });
        }

        Ok(Self {
            observations,
            levels1,
            levels2,
            names1: None,
            names2: None,
        })
    }

    /// Build a dataset from string labels, coding each factor by its sorted
    /// distinct labels.
    pub fn from_labels<S: AsRef<str>>(values: &[f64], labels1: &[S], labels2: &[S]) -> Result<Self> {
        let (codes1, names1) = code_labels(labels1);
        let (codes2, names2) = code_labels(labels2);
        Self::new(values, &codes1, &codes2, names1.len(), names2.len())?
            .with_level_names(names1, names2)
    }

    /// Attach human-readable level names for reporting.
    pub fn with_level_names(mut self, names1: Vec<String>, names2: Vec<String>) -> Result<Self> {
        if names1.len() != self.levels1 {
            return Err(Error::DataValidation(format!(
                "x1 has {} levels but {} names",
                self.levels1,
                names1.len()
            )));
        }
        if names2.len() != self.levels2 {
            return Err(Error::DataValidation(format!(
                "x2 has {} levels but {} names",
                self.levels2,
                names2.len()
            )));
        }
        self.names1 = Some(names1);
        self.names2 = Some(names2);
        Ok(self)
    }

    /// A copy with every response value replaced by `f(value)`.
    ///
    /// Level structure and names are preserved.
    pub fn map_response<F>(&self, mut f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        let observations = self
            .observations
            .iter()
            .map(|obs| Observation {
                value: f(obs.value),
                ..*obs
            })
            .collect();
        Self {
            observations,
            levels1: self.levels1,
            levels2: self.levels2,
            names1: self.names1.clone(),
            names2: self.names2.clone(),
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn response(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn levels(&self, factor: Factor) -> usize {
        match factor {
            Factor::X1 => self.levels1,
            Factor::X2 => self.levels2,
        }
    }

    pub fn level_names(&self, factor: Factor) -> Option<&[String]> {
        match factor {
            Factor::X1 => self.names1.as_deref(),
            Factor::X2 => self.names2.as_deref(),
        }
    }

    /// Name of a level, falling back to its index.
    pub fn level_label(&self, factor: Factor, level: usize) -> String {
        self.level_names(factor)
            .and_then(|names| names.get(level).cloned())
            .unwrap_or_else(|| level.to_string())
    }

    /// Observation count per (x1, x2) cell, row-major.
    pub fn cell_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.levels1 * self.levels2];
        for obs in &self.observations {
            counts[obs.level1 * self.levels2 + obs.level2] += 1;
        }
        counts
    }
}

fn check_level(factor: Factor, observation: usize, index: usize, levels: usize) -> Result<()> {
    if index >= levels {
        return Err(Error::LevelOutOfRange {
            factor: factor.to_string(),
            observation,
            index,
            levels,
        });
    }
    Ok(())
}

fn code_labels<S: AsRef<str>>(labels: &[S]) -> (Vec<usize>, Vec<String>) {
    let mut names: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
    names.sort();
    names.dedup();
    let codes = labels
        .iter()
        .map(|s| {
            names
                .binary_search_by(|n| n.as_str().cmp(s.as_ref()))
                .unwrap_or_default()
        })
        .collect();
    (codes, names)
}
