//! Hierarchical priors with adaptive group-level shrinkage.
//!
//! ```text
//! u_g        ~ StudentT(ν = 1, μ = 0, λ = 0.001)      g ∈ {a1, a2, a1a2}
//! scale_g    = |u_g| + floor
//! a0         ~ Normal(0, τ = 0.001)
//! a_g[...]   ~ Normal(0, τ = 1/scale_g²)              i.i.d. within a group
//! sigma      ~ Uniform(0, 10)
//! ```
//!
//! Groups without signal let `u_g` collapse toward zero, which pins their scale at
//! the floor and shrinks the level effects toward zero.

use banova_math::{
    iid_zero_mean_normal_log_pdf, normal_log_pdf_precision, student_t_log_pdf, sum_log_terms,
    uniform_log_pdf, uniform_mean,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::layout::{EffectGroup, ParameterLayout, A0, SIGMA};

/// Fixed hyper constants of the prior graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorConstants {
    /// Degrees of freedom of the hyper-scale Student-t.
    pub hyper_nu: f64,
    /// Precision of the hyper-scale Student-t.
    pub hyper_lambda: f64,
    /// Minimum HyperScale.
    pub scale_floor: f64,
    /// Precision of the baseline prior.
    pub baseline_precision: f64,
    /// Lower bound of the residual sd prior.
    pub sigma_lower: f64,
    /// Upper bound of the residual sd prior.
    pub sigma_upper: f64,
}

impl Default for PriorConstants {
    fn default() -> Self {
        Self {
            hyper_nu: 1.0,
            hyper_lambda: 0.001,
            scale_floor: 0.1,
            baseline_precision: 0.001,
            sigma_lower: 0.0,
            sigma_upper: 10.0,
        }
    }
}

/// Prior half of the joint density.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalPrior {
    constants: PriorConstants,
    layout: ParameterLayout,
}

impl HierarchicalPrior {
    pub(crate) fn new(constants: PriorConstants, layout: ParameterLayout) -> Self {
        Self { constants, layout }
    }

    pub fn constants(&self) -> &PriorConstants {
        &self.constants
    }

    /// `|u| + floor`.
    pub fn hyper_scale(&self, unabs: f64) -> f64 {
        unabs.abs() + self.constants.scale_floor
    }

    /// HyperScale of a group in state `theta`.
    pub fn group_scale(&self, theta: &[f64], group: EffectGroup) -> f64 {
        self.hyper_scale(theta[self.layout.hyper_index(group)])
    }

    /// Log prior density of a full state. Non-finite results collapse to `-inf`.
    pub fn log_density(&self, theta: &[f64]) -> f64 {
        let c = &self.constants;

        let sigma_term = uniform_log_pdf(theta[SIGMA], c.sigma_lower, c.sigma_upper);
        if sigma_term == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }

        let hyper_terms = EffectGroup::ALL.iter().map(|g| {
            student_t_log_pdf(theta[self.layout.hyper_index(*g)], c.hyper_nu, 0.0, c.hyper_lambda)
        });
        let effect_terms = EffectGroup::ALL.iter().map(|g| {
            let scale = self.group_scale(theta, *g);
            iid_zero_mean_normal_log_pdf(self.layout.block(theta, *g), 1.0 / (scale * scale))
        });
        let baseline = normal_log_pdf_precision(theta[A0], 0.0, c.baseline_precision);

        sum_log_terms(
            std::iter::once(sigma_term)
                .chain(std::iter::once(baseline))
                .chain(hyper_terms)
                .chain(effect_terms),
        )
    }

    /// Prior means used as the fallback starting point.
    ///
    /// Hyper variables, baseline and effects sit at zero; `sigma` at the mean of
    /// its uniform prior.
    pub fn default_start(&self) -> Vec<f64> {
        let mut theta = vec![0.0; self.layout.dim()];
        theta[SIGMA] = uniform_mean(self.constants.sigma_lower, self.constants.sigma_upper);
        theta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layout::HYPER_A2;

    fn prior(levels1: usize, levels2: usize) -> HierarchicalPrior {
        HierarchicalPrior::new(
            PriorConstants::default(),
            ParameterLayout::new(levels1, levels2),
        )
    }

    #[test]
    fn hyper_scale_has_floor() {
        let p = prior(2, 2);
        assert_eq!(p.hyper_scale(0.0), 0.1);
        assert_eq!(p.hyper_scale(-2.0), 2.1);
        assert_eq!(p.hyper_scale(2.0), 2.1);
    }

    #[test]
    fn default_start_is_finite() {
        let p = prior(3, 2);
        let start = p.default_start();
        assert_eq!(start[SIGMA], 5.0);
        assert!(p.log_density(&start).is_finite());
    }

    #[test]
    fn sigma_outside_support_is_neg_inf() {
        let p = prior(2, 2);
        let mut theta = p.default_start();
        theta[SIGMA] = 0.0;
        assert_eq!(p.log_density(&theta), f64::NEG_INFINITY);
        theta[SIGMA] = 10.5;
        assert_eq!(p.log_density(&theta), f64::NEG_INFINITY);
    }

    #[test]
    fn hyper_prior_is_symmetric_in_u() {
        let p = prior(2, 2);
        let mut pos = p.default_start();
        pos[HYPER_A2] = 1.7;
        let mut neg = pos.clone();
        neg[HYPER_A2] = -1.7;
        assert!((p.log_density(&pos) - p.log_density(&neg)).abs() < 1e-12);
    }

    #[test]
    fn larger_scale_tolerates_larger_effects() {
        let p = prior(2, 2);
        let layout = ParameterLayout::new(2, 2);
        let mut tight = p.default_start();
        layout.block_mut(&mut tight, EffectGroup::A1).copy_from_slice(&[2.0, -2.0]);
        let mut wide = tight.clone();
        wide[layout.hyper_index(EffectGroup::A1)] = 2.0;
        assert!(p.log_density(&wide) > p.log_density(&tight));
    }

    #[test]
    fn log_density_matches_hand_computation() {
        let p = prior(1, 1);
        let theta = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let c = PriorConstants::default();
        let t0 = student_t_log_pdf(0.0, 1.0, 0.0, 0.001);
        let expected = -(10.0f64).ln()
            + normal_log_pdf_precision(0.0, 0.0, c.baseline_precision)
            + 3.0 * t0
            + 3.0 * normal_log_pdf_precision(0.0, 0.0, 100.0);
        assert!((p.log_density(&theta) - expected).abs() < 1e-10);
    }
}
