//! Posterior post-processing: burn-in, thinning, centering and rescaling.
//!
//! Retained iterations are `burnin, burnin + thin, ...` below the chain length.
//! For each one the raw state is split into its blocks, the effects are centered
//! (sum-to-zero for `b1`/`b2`, overall mean for `b1a2`) and mapped back to
//! response units with the [`Standardizer`].

use banova_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::data::Standardizer;
use crate::model::{CenteredEffects, EffectGroup, EffectMatrix, HierarchicalPrior, ParameterLayout};
use crate::model::layout::{A0, SIGMA};
use crate::sampler::Chain;

/// HyperScale of each effect group, standardized units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HyperScales {
    pub a1: f64,
    pub a2: f64,
    pub a1a2: f64,
}

/// One retained draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorSample {
    /// Chain iteration this draw came from.
    pub iteration: usize,

    /// Raw baseline, standardized units.
    pub a0: f64,
    /// Raw `x1` effects, standardized units.
    pub a1: Vec<f64>,
    /// Raw `x2` effects, standardized units.
    pub a2: Vec<f64>,
    /// Raw interaction effects, standardized units.
    pub a1a2: EffectMatrix,
    /// Residual sd, standardized units.
    pub sigma_z: f64,
    pub hyper_scales: HyperScales,

    /// `a0 * std + mean`.
    pub baseline: f64,
    /// Centered `x1` effects in response units.
    pub b1: Vec<f64>,
    /// Centered `x2` effects in response units.
    pub b2: Vec<f64>,
    /// Interaction effects centered by their overall mean, in response units.
    pub b1a2: EffectMatrix,
    /// Residual sd in response units.
    pub sigma: f64,
}

/// Ordered set of retained draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorSamples {
    pub burnin: usize,
    pub thin: usize,
    pub chain_length: usize,
    pub samples: Vec<PosteriorSample>,
}

impl PosteriorSamples {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PosteriorSample> {
        self.samples.iter()
    }

    pub fn baseline(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.baseline).collect()
    }

    pub fn sigma(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.sigma).collect()
    }

    /// Draws of `b1[level]`.
    pub fn b1(&self, level: usize) -> Vec<f64> {
        self.samples.iter().map(|s| s.b1[level]).collect()
    }

    /// Draws of `b2[level]`.
    pub fn b2(&self, level: usize) -> Vec<f64> {
        self.samples.iter().map(|s| s.b2[level]).collect()
    }

    /// Draws of `b1a2[row, col]`.
    pub fn b1a2(&self, row: usize, col: usize) -> Vec<f64> {
        self.samples.iter().map(|s| s.b1a2.get(row, col)).collect()
    }
}

/// Retention window of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosteriorProcessor {
    burnin: usize,
    thin: usize,
}

impl PosteriorProcessor {
    pub fn new(burnin: usize, thin: usize) -> Result<Self> {
        if thin == 0 {
            return Err(Error::InvalidConfigValue {
                field: "thin".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self { burnin, thin })
    }

    pub fn burnin(&self) -> usize {
        self.burnin
    }

    pub fn thin(&self) -> usize {
        self.thin
    }

    /// Chain indices kept for a chain of `chain_length` states.
    pub fn retained(&self, chain_length: usize) -> Result<std::iter::StepBy<std::ops::Range<usize>>> {
        if self.burnin >= chain_length {
            return Err(Error::InvalidConfigValue {
                field: "burnin".to_string(),
                message: format!(
                    "burnin {} must be smaller than the chain length {}",
                    self.burnin, chain_length
                ),
            });
        }
        Ok((self.burnin..chain_length).step_by(self.thin))
    }

    pub fn process(
        &self,
        chain: &Chain,
        layout: &ParameterLayout,
        prior: &HierarchicalPrior,
        standardizer: &Standardizer,
    ) -> Result<PosteriorSamples> {
        if chain.dim() != layout.dim() {
            return Err(Error::Sampling(format!(
                "chain has {} coordinates, layout expects {}",
                chain.dim(),
                layout.dim()
            )));
        }

        let samples = self
            .retained(chain.len())?
            .map(|i| draw_sample(i, chain.draw(i), layout, prior, standardizer))
            .collect();

        Ok(PosteriorSamples {
            burnin: self.burnin,
            thin: self.thin,
            chain_length: chain.len(),
            samples,
        })
    }
}

fn draw_sample(
    iteration: usize,
    theta: &[f64],
    layout: &ParameterLayout,
    prior: &HierarchicalPrior,
    standardizer: &Standardizer,
) -> PosteriorSample {
    let centered = CenteredEffects::from_state(layout, theta);
    let rescale = |v: &[f64]| -> Vec<f64> {
        v.iter().map(|x| standardizer.rescale_effect(*x)).collect()
    };

    PosteriorSample {
        iteration,
        a0: theta[A0],
        a1: layout.block(theta, EffectGroup::A1).to_vec(),
        a2: layout.block(theta, EffectGroup::A2).to_vec(),
        a1a2: layout.interaction(theta),
        sigma_z: theta[SIGMA],
        hyper_scales: HyperScales {
            a1: prior.group_scale(theta, EffectGroup::A1),
            a2: prior.group_scale(theta, EffectGroup::A2),
            a1a2: prior.group_scale(theta, EffectGroup::A1a2),
        },
        baseline: standardizer.invert(theta[A0]),
        b1: rescale(&centered.b1),
        b2: rescale(&centered.b2),
        b1a2: centered.b1a2.scaled(standardizer.std()),
        sigma: standardizer.rescale_effect(theta[SIGMA]),
    }
}
