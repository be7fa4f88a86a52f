//! Posterior summaries for reporting.

use banova_math::{fraction_below, hdi, mean, median, population_std};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::contrast::ContrastDraws;
use crate::data::{Dataset, Factor};
use crate::posterior::PosteriorSamples;

/// Interval mass and reference value used for every summary of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryOptions {
    pub credible_mass: f64,
    pub comparison_value: f64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            credible_mass: 0.95,
            comparison_value: 0.0,
        }
    }
}

/// Location, spread and credible interval of one scalar posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorSummary {
    pub label: String,
    pub draws: usize,
    pub mean: f64,
    pub median: f64,
    pub sd: f64,
    pub hdi_lower: f64,
    pub hdi_upper: f64,
    pub credible_mass: f64,
    pub comparison_value: f64,
    /// Fraction of draws strictly below the comparison value.
    pub prob_below: f64,
    /// Fraction of draws strictly above the comparison value.
    pub prob_above: f64,
}

impl PosteriorSummary {
    /// `None` for an empty draw sequence.
    pub fn from_draws(label: impl Into<String>, draws: &[f64], options: &SummaryOptions) -> Option<Self> {
        let interval = hdi(draws, options.credible_mass)?;
        let c = options.comparison_value;
        let above = draws.iter().filter(|v| **v > c).count() as f64 / draws.len() as f64;
        Some(Self {
            label: label.into(),
            draws: draws.len(),
            mean: mean(draws),
            median: median(draws),
            sd: population_std(draws),
            hdi_lower: interval.lower,
            hdi_upper: interval.upper,
            credible_mass: options.credible_mass,
            comparison_value: c,
            prob_below: fraction_below(draws, c),
            prob_above: above,
        })
    }

    /// Whether the HDI excludes the comparison value.
    pub fn excludes_comparison(&self) -> bool {
        self.comparison_value < self.hdi_lower || self.comparison_value > self.hdi_upper
    }
}

/// Summaries of every reported quantity, original response units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EffectSummaries {
    pub baseline: PosteriorSummary,
    pub sigma: PosteriorSummary,
    pub b1: Vec<PosteriorSummary>,
    pub b2: Vec<PosteriorSummary>,
    /// Row-major over (x1 level, x2 level).
    pub b1a2: Vec<PosteriorSummary>,
}

/// Summarize baseline, sigma and every effect cell. `None` without draws.
pub fn summarize_effects(
    samples: &PosteriorSamples,
    data: &Dataset,
    options: &SummaryOptions,
) -> Option<EffectSummaries> {
    let n1 = data.levels(Factor::X1);
    let n2 = data.levels(Factor::X2);

    let b1 = (0..n1)
        .map(|i| {
            let label = format!("b1[{}]", data.level_label(Factor::X1, i));
            PosteriorSummary::from_draws(label, &samples.b1(i), options)
        })
        .collect::<Option<Vec<_>>>()?;
    let b2 = (0..n2)
        .map(|j| {
            let label = format!("b2[{}]", data.level_label(Factor::X2, j));
            PosteriorSummary::from_draws(label, &samples.b2(j), options)
        })
        .collect::<Option<Vec<_>>>()?;

    let mut b1a2 = Vec::with_capacity(n1 * n2);
    for i in 0..n1 {
        for j in 0..n2 {
            let label = format!(
                "b1a2[{},{}]",
                data.level_label(Factor::X1, i),
                data.level_label(Factor::X2, j)
            );
            b1a2.push(PosteriorSummary::from_draws(label, &samples.b1a2(i, j), options)?);
        }
    }

    Some(EffectSummaries {
        baseline: PosteriorSummary::from_draws("b0", &samples.baseline(), options)?,
        sigma: PosteriorSummary::from_draws("sigma", &samples.sigma(), options)?,
        b1,
        b2,
        b1a2,
    })
}

pub fn summarize_contrasts(contrasts: &[ContrastDraws], options: &SummaryOptions) -> Vec<PosteriorSummary> {
    contrasts
        .iter()
        .filter_map(|c| PosteriorSummary::from_draws(c.name.clone(), &c.draws, options))
        .collect()
}
