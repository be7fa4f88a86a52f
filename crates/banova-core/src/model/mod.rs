//! The hierarchical two-way ANOVA model.
//!
//! [`ModelBuilder`] declares one parameter block per effect group, checks every
//! declaration against the dataset's level counts, and produces an
//! [`AnovaModel`]: the joint log density (priors + likelihood) the sampler
//! explores.

pub mod effects;
pub mod layout;
pub mod likelihood;
pub mod prior;

pub use effects::{center, dot, EffectMatrix};
pub use layout::{EffectGroup, ParameterLayout, Shape};
pub use likelihood::{CenteredEffects, Likelihood};
pub use prior::{HierarchicalPrior, PriorConstants};

use std::collections::BTreeMap;

use banova_common::{Error, Result};

use crate::data::{Dataset, Factor};
use crate::sampler::LogDensity;

/// Declares parameter shapes and hyper constants, then validates them.
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    data: &'a Dataset,
    constants: PriorConstants,
    declared: BTreeMap<&'static str, (EffectGroup, Shape)>,
}

impl<'a> ModelBuilder<'a> {
    /// Start from the shapes implied by the dataset's level counts.
    pub fn new(data: &'a Dataset) -> Self {
        let layout = ParameterLayout::new(data.levels(Factor::X1), data.levels(Factor::X2));
        let declared = EffectGroup::ALL
            .iter()
            .map(|g| (g.name(), (*g, layout.shape(*g))))
            .collect();
        Self {
            data,
            constants: PriorConstants::default(),
            declared,
        }
    }

    pub fn scale_floor(mut self, floor: f64) -> Self {
        self.constants.scale_floor = floor;
        self
    }

    pub fn constants(mut self, constants: PriorConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Override the declared shape of one group.
    pub fn declare(mut self, group: EffectGroup, shape: Shape) -> Self {
        self.declared.insert(group.name(), (group, shape));
        self
    }

    pub fn build(self) -> Result<AnovaModel<'a>> {
        let layout = ParameterLayout::new(
            self.data.levels(Factor::X1),
            self.data.levels(Factor::X2),
        );

        for (group, shape) in self.declared.values() {
            let expected = layout.shape(*group);
            if *shape != expected {
                return Err(Error::ShapeMismatch {
                    group: group.to_string(),
                    declared: shape.to_string(),
                    expected: expected.to_string(),
                });
            }
        }

        let c = &self.constants;
        if !(c.scale_floor > 0.0 && c.scale_floor.is_finite()) {
            return Err(Error::ModelConstruction(format!(
                "scale floor must be positive and finite, got {}",
                c.scale_floor
            )));
        }
        for (name, value) in [
            ("hyper_nu", c.hyper_nu),
            ("hyper_lambda", c.hyper_lambda),
            ("baseline_precision", c.baseline_precision),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(Error::ModelConstruction(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if !(c.sigma_upper > c.sigma_lower && c.sigma_lower >= 0.0) {
            return Err(Error::ModelConstruction(format!(
                "sigma prior bounds ({}, {}) are not a valid interval",
                c.sigma_lower, c.sigma_upper
            )));
        }

        Ok(AnovaModel {
            layout,
            prior: HierarchicalPrior::new(self.constants, layout),
            likelihood: Likelihood::new(self.data, layout),
        })
    }
}

/// Joint model over a standardized dataset.
#[derive(Debug, Clone)]
pub struct AnovaModel<'a> {
    layout: ParameterLayout,
    prior: HierarchicalPrior,
    likelihood: Likelihood<'a>,
}

impl<'a> AnovaModel<'a> {
    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn prior(&self) -> &HierarchicalPrior {
        &self.prior
    }

    pub fn likelihood(&self) -> &Likelihood<'a> {
        &self.likelihood
    }
}

impl LogDensity for AnovaModel<'_> {
    fn dim(&self) -> usize {
        self.layout.dim()
    }

    fn log_density(&self, theta: &[f64]) -> f64 {
        let prior = self.prior.log_density(theta);
        if prior == f64::NEG_INFINITY {
            return prior;
        }
        let lik = self.likelihood.log_density(theta);
        if lik == f64::NEG_INFINITY {
            return lik;
        }
        banova_math::finite_or_neg_inf(prior + lik)
    }

    fn default_start(&self) -> Vec<f64> {
        self.prior.default_start()
    }

    fn coordinate_names(&self) -> Vec<String> {
        self.layout.coordinate_names()
    }
}
