//! Named contrasts over posterior effects.
//!
//! A contrast is a weight vector over the levels of one factor (dotted with `b1`
//! or `b2`) or the outer product of one vector per factor (contracted with
//! `b1a2`). Dimensions are checked when a contrast is registered, so evaluation
//! over a validated [`ContrastSet`] only fails if the samples come from a
//! different design.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use banova_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Factor};
use crate::model::{dot, EffectMatrix};
use crate::posterior::{PosteriorSample, PosteriorSamples};

/// Which effect block a contrast reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContrastTarget {
    X1,
    X2,
    X1x2,
}

impl ContrastTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            ContrastTarget::X1 => "x1",
            ContrastTarget::X2 => "x2",
            ContrastTarget::X1x2 => "x1x2",
        }
    }
}

impl From<Factor> for ContrastTarget {
    fn from(factor: Factor) -> Self {
        match factor {
            Factor::X1 => ContrastTarget::X1,
            Factor::X2 => ContrastTarget::X2,
        }
    }
}

impl FromStr for ContrastTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x1" => Ok(ContrastTarget::X1),
            "x2" => Ok(ContrastTarget::X2),
            "x1x2" => Ok(ContrastTarget::X1x2),
            other => Err(Error::UnknownContrastGroup(other.to_string())),
        }
    }
}

impl std::fmt::Display for ContrastTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weight vector per factor; the interaction weights are their outer product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct InteractionWeights {
    pub factor1: Vec<f64>,
    pub factor2: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContrastWeights {
    MainEffect(Vec<f64>),
    Interaction(InteractionWeights),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Contrast {
    pub name: String,
    pub target: ContrastTarget,
    pub weights: ContrastWeights,
}

impl Contrast {
    pub fn main_effect(name: impl Into<String>, factor: Factor, weights: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            target: factor.into(),
            weights: ContrastWeights::MainEffect(weights),
        }
    }

    pub fn interaction(name: impl Into<String>, factor1: Vec<f64>, factor2: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            target: ContrastTarget::X1x2,
            weights: ContrastWeights::Interaction(InteractionWeights { factor1, factor2 }),
        }
    }

    /// Check weight lengths against level counts.
    pub fn check_dimensions(&self, levels1: usize, levels2: usize) -> Result<()> {
        let mismatch = |target: &str, expected: usize, actual: usize| Error::ContrastDimension {
            name: self.name.clone(),
            target: target.to_string(),
            expected,
            actual,
        };
        match (&self.weights, self.target) {
            (ContrastWeights::MainEffect(w), ContrastTarget::X1) if w.len() != levels1 => {
                Err(mismatch("factor x1", levels1, w.len()))
            }
            (ContrastWeights::MainEffect(w), ContrastTarget::X2) if w.len() != levels2 => {
                Err(mismatch("factor x2", levels2, w.len()))
            }
            (ContrastWeights::MainEffect(_), ContrastTarget::X1x2) => Err(Error::Contrast(format!(
                "contrast '{}' targets x1x2 but has a single weight vector",
                self.name
            ))),
            (ContrastWeights::Interaction(_), ContrastTarget::X1 | ContrastTarget::X2) => {
                Err(Error::Contrast(format!(
                    "contrast '{}' targets {} but has interaction weights",
                    self.name, self.target
                )))
            }
            (ContrastWeights::Interaction(w), ContrastTarget::X1x2) => {
                if w.factor1.len() != levels1 {
                    Err(mismatch("the x1 side of x1x2", levels1, w.factor1.len()))
                } else if w.factor2.len() != levels2 {
                    Err(mismatch("the x2 side of x1x2", levels2, w.factor2.len()))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Value of the contrast for one retained draw.
    pub fn evaluate_sample(&self, sample: &PosteriorSample) -> Result<f64> {
        self.check_dimensions(sample.b1.len(), sample.b2.len())?;
        Ok(match &self.weights {
            ContrastWeights::MainEffect(w) => match self.target {
                ContrastTarget::X2 => dot(w, &sample.b2),
                _ => dot(w, &sample.b1),
            },
            ContrastWeights::Interaction(w) => {
                EffectMatrix::outer(&w.factor1, &w.factor2).contract(&sample.b1a2)
            }
        })
    }

    /// Posterior of the contrast: one value per retained draw, in draw order.
    pub fn evaluate(&self, samples: &PosteriorSamples) -> Result<Vec<f64>> {
        samples.iter().map(|s| self.evaluate_sample(s)).collect()
    }
}

/// Posterior draws of one named contrast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContrastDraws {
    pub name: String,
    pub target: ContrastTarget,
    pub draws: Vec<f64>,
}

/// Contrasts validated against one design, kept in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastSet {
    levels1: usize,
    levels2: usize,
    contrasts: Vec<Contrast>,
    names: HashSet<String>,
}

impl ContrastSet {
    pub fn new(levels1: usize, levels2: usize) -> Self {
        Self {
            levels1,
            levels2,
            contrasts: Vec::new(),
            names: HashSet::new(),
        }
    }

    pub fn for_dataset(data: &Dataset) -> Self {
        Self::new(data.levels(Factor::X1), data.levels(Factor::X2))
    }

    /// Validate and add a contrast. Names are unique across all targets.
    pub fn register(&mut self, contrast: Contrast) -> Result<()> {
        if contrast.name.trim().is_empty() {
            return Err(Error::Contrast("contrast name must not be empty".to_string()));
        }
        if self.names.contains(&contrast.name) {
            return Err(Error::Contrast(format!(
                "duplicate contrast name '{}'",
                contrast.name
            )));
        }
        contrast.check_dimensions(self.levels1, self.levels2)?;
        self.names.insert(contrast.name.clone());
        self.contrasts.push(contrast);
        Ok(())
    }

    pub fn extend<I: IntoIterator<Item = Contrast>>(&mut self, contrasts: I) -> Result<()> {
        for c in contrasts {
            self.register(c)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.contrasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contrasts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contrast> {
        self.contrasts.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Contrast> {
        self.contrasts.iter().find(|c| c.name == name)
    }

    pub fn evaluate(&self, samples: &PosteriorSamples) -> Result<Vec<ContrastDraws>> {
        self.contrasts
            .iter()
            .map(|c| {
                let draws = c.evaluate(samples)?;
                tracing::debug!(
                    target: crate::logging::event_names::CONTRAST_EVALUATED,
                    contrast = %c.name,
                    draws = draws.len(),
                    "contrast evaluated"
                );
                Ok(ContrastDraws {
                    name: c.name.clone(),
                    target: c.target,
                    draws,
                })
            })
            .collect()
    }
}

/// Contrast definitions as read from JSON:
///
/// ```json
/// { "x1": { "AvB": [1, -1, 0] },
///   "x1x2": { "AvBxCvD": { "factor1": [1, -1, 0], "factor2": [1, -1] } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContrastDocument {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub x1: BTreeMap<String, Vec<f64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub x2: BTreeMap<String, Vec<f64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub x1x2: BTreeMap<String, InteractionWeights>,
}

impl ContrastDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a document. Top-level keys other than the three groups fail with
    /// `UnknownContrastGroup`.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut doc = ContrastDocument::default();
        for (group, value) in raw {
            match group.parse::<ContrastTarget>()? {
                ContrastTarget::X1 => doc.x1 = serde_json::from_value(value)?,
                ContrastTarget::X2 => doc.x2 = serde_json::from_value(value)?,
                ContrastTarget::X1x2 => doc.x1x2 = serde_json::from_value(value)?,
            }
        }
        Ok(doc)
    }

    /// Contrasts in group order (`x1`, `x2`, `x1x2`), by name within a group.
    pub fn into_contrasts(self) -> Vec<Contrast> {
        let mut out = Vec::with_capacity(self.x1.len() + self.x2.len() + self.x1x2.len());
        out.extend(
            self.x1
                .into_iter()
                .map(|(name, w)| Contrast::main_effect(name, Factor::X1, w)),
        );
        out.extend(
            self.x2
                .into_iter()
                .map(|(name, w)| Contrast::main_effect(name, Factor::X2, w)),
        );
        out.extend(
            self.x1x2
                .into_iter()
                .map(|(name, w)| Contrast::interaction(name, w.factor1, w.factor2)),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::HyperScales;

    fn sample(b1: Vec<f64>, b2: Vec<f64>, b1a2: EffectMatrix) -> PosteriorSample {
        PosteriorSample {
            iteration: 0,
            a0: 0.0,
            a1: b1.clone(),
            a2: b2.clone(),
            a1a2: b1a2.clone(),
            sigma_z: 1.0,
            hyper_scales: HyperScales {
                a1: 0.1,
                a2: 0.1,
                a1a2: 0.1,
            },
            baseline: 0.0,
            b1,
            b2,
            b1a2,
            sigma: 1.0,
        }
    }

    fn samples() -> PosteriorSamples {
        let m = EffectMatrix::from_row_major(2, 3, vec![1.0, -2.0, 1.0, -1.0, 2.0, -1.0]).unwrap();
        PosteriorSamples {
            burnin: 0,
            thin: 1,
            chain_length: 2,
            samples: vec![
                sample(vec![1.5, -1.5], vec![0.5, 0.0, -0.5], m.clone()),
                sample(vec![-0.25, 0.25], vec![1.0, -2.0, 1.0], m.scaled(2.0)),
            ],
        }
    }

    #[test]
    fn main_effect_is_dot_product() {
        let c = Contrast::main_effect("AvB", Factor::X1, vec![1.0, -1.0]);
        assert_eq!(c.evaluate(&samples()).unwrap(), vec![3.0, -0.5]);

        let c = Contrast::main_effect("BvC", Factor::X2, vec![0.0, 1.0, -1.0]);
        assert_eq!(c.evaluate(&samples()).unwrap(), vec![0.5, -3.0]);
    }

    #[test]
    fn interaction_is_full_contraction() {
        let c = Contrast::interaction("ix", vec![1.0, -1.0], vec![1.0, 0.0, -1.0]);
        // outer = [[1,0,-1],[-1,0,1]]; contraction with m = 1 - 1 + 1 - 1 = 0
        assert_eq!(c.evaluate(&samples()).unwrap(), vec![0.0, 0.0]);

        let c = Contrast::interaction("iy", vec![1.0, 0.0], vec![0.0, 1.0, 0.0]);
        assert_eq!(c.evaluate(&samples()).unwrap(), vec![-2.0, -4.0]);
    }

    #[test]
    fn all_zero_contrast_is_exactly_zero() {
        let c = Contrast::main_effect("zero", Factor::X2, vec![0.0; 3]);
        assert!(c.evaluate(&samples()).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn registration_checks_dimensions() {
        let mut set = ContrastSet::new(2, 3);
        let err = set
            .register(Contrast::main_effect("bad", Factor::X1, vec![1.0, 0.0, -1.0]))
            .unwrap_err();
        match err {
            Error::ContrastDimension {
                name,
                expected,
                actual,
                ..
            } => {
                assert_eq!(name, "bad");
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = set
            .register(Contrast::interaction("ix", vec![1.0, -1.0], vec![1.0, -1.0]))
            .unwrap_err();
        assert_eq!(err.category(), banova_common::ErrorCategory::Contrast);
        assert!(set.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut set = ContrastSet::new(2, 3);
        set.register(Contrast::main_effect("c", Factor::X1, vec![1.0, -1.0]))
            .unwrap();
        let err = set
            .register(Contrast::main_effect("c", Factor::X2, vec![1.0, -1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(err, Error::Contrast(_)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn set_evaluates_in_registration_order() {
        let mut set = ContrastSet::new(2, 3);
        set.extend([
            Contrast::main_effect("second", Factor::X2, vec![1.0, 0.0, 0.0]),
            Contrast::main_effect("first", Factor::X1, vec![1.0, 0.0]),
        ])
        .unwrap();
        let out = set.evaluate(&samples()).unwrap();
        assert_eq!(out[0].name, "second");
        assert_eq!(out[0].draws, vec![0.5, 1.0]);
        assert_eq!(out[1].draws, vec![1.5, -0.25]);
        assert!(set.get("first").is_some());
    }

    #[test]
    fn evaluation_against_other_design_fails() {
        let c = Contrast::main_effect("wide", Factor::X1, vec![1.0, 0.0, -1.0]);
        let err = c.evaluate(&samples()).unwrap_err();
        assert!(matches!(err, Error::ContrastDimension { .. }));
    }

    #[test]
    fn document_parsing() {
        let doc = ContrastDocument::from_json(
            r#"{
                "x1": { "AvB": [1, -1] },
                "x2": { "CvD": [0, 1, -1] },
                "x1x2": { "AxC": { "factor1": [1, -1], "factor2": [1, 0, -1] } }
            }"#,
        )
        .unwrap();
        let contrasts = doc.into_contrasts();
        assert_eq!(contrasts.len(), 3);
        assert_eq!(contrasts[0].target, ContrastTarget::X1);
        assert_eq!(contrasts[2].target, ContrastTarget::X1x2);

        let mut set = ContrastSet::new(2, 3);
        set.extend(contrasts).unwrap();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn unknown_group_is_rejected() {
        let err = ContrastDocument::from_json(r#"{ "x3": { "a": [1] } }"#).unwrap_err();
        assert!(matches!(err, Error::UnknownContrastGroup(ref g) if g == "x3"));
        assert!("x1x3".parse::<ContrastTarget>().is_err());
        assert_eq!("x1x2".parse::<ContrastTarget>().unwrap(), ContrastTarget::X1x2);
    }
}
