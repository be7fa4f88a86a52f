//! Observed-data likelihood over centered effects.

use banova_math::{finite_or_neg_inf, LN_2PI};

use super::effects::{center, EffectMatrix};
use super::layout::{EffectGroup, ParameterLayout, A0, SIGMA};
use crate::data::Dataset;

/// Identifiable effects of one state: `b = a - mean(a)` per group.
#[derive(Debug, Clone, PartialEq)]
pub struct CenteredEffects {
    pub a0: f64,
    pub b1: Vec<f64>,
    pub b2: Vec<f64>,
    pub b1a2: EffectMatrix,
}

impl CenteredEffects {
    pub fn from_state(layout: &ParameterLayout, theta: &[f64]) -> Self {
        Self {
            a0: theta[A0],
            b1: center(layout.block(theta, EffectGroup::A1)),
            b2: center(layout.block(theta, EffectGroup::A2)),
            b1a2: layout.interaction(theta).centered(),
        }
    }

    /// `a0 + b1[l1] + b2[l2] + b1a2[l1, l2]`.
    pub fn predict(&self, level1: usize, level2: usize) -> f64 {
        self.a0 + self.b1[level1] + self.b2[level2] + self.b1a2.get(level1, level2)
    }
}

/// Normal likelihood of the standardized response with a shared residual sd.
#[derive(Debug, Clone)]
pub struct Likelihood<'a> {
    data: &'a Dataset,
    layout: ParameterLayout,
}

impl<'a> Likelihood<'a> {
    pub(crate) fn new(data: &'a Dataset, layout: ParameterLayout) -> Self {
        Self { data, layout }
    }

    /// Linear predictor for every observation, in dataset order.
    pub fn linear_predictor(&self, theta: &[f64]) -> Vec<f64> {
        let effects = CenteredEffects::from_state(&self.layout, theta);
        self.data
            .observations()
            .iter()
            .map(|obs| effects.predict(obs.level1, obs.level2))
            .collect()
    }

    /// Log likelihood. `-inf` when sigma is not positive or anything overflows.
    pub fn log_density(&self, theta: &[f64]) -> f64 {
        let sigma = theta[SIGMA];
        if !(sigma > 0.0) {
            return f64::NEG_INFINITY;
        }
        let tau = 1.0 / (sigma * sigma);
        let effects = CenteredEffects::from_state(&self.layout, theta);

        let mut sum_sq = 0.0;
        for obs in self.data.observations() {
            let resid = obs.value - effects.predict(obs.level1, obs.level2);
            sum_sq += resid * resid;
        }
        let n = self.data.len() as f64;
        finite_or_neg_inf(0.5 * n * (tau.ln() - LN_2PI) - 0.5 * tau * sum_sq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banova_math::normal_log_pdf_precision;

    fn two_by_two() -> Dataset {
        Dataset::new(&[1.0, 2.0, 3.0, 4.0], &[0, 0, 1, 1], &[0, 1, 0, 1], 2, 2).unwrap()
    }

    #[test]
    fn predictor_uses_centered_effects() {
        let data = two_by_two();
        let layout = ParameterLayout::new(2, 2);
        let mut theta = vec![0.0; layout.dim()];
        theta[A0] = 1.0;
        // Shifting every a1 level by the same constant must not change mu.
        layout.block_mut(&mut theta, EffectGroup::A1).copy_from_slice(&[3.0, 5.0]);
        let lik = Likelihood::new(&data, layout);
        let mu = lik.linear_predictor(&theta);
        assert_eq!(mu, vec![0.0, 0.0, 2.0, 2.0]);

        layout.block_mut(&mut theta, EffectGroup::A1).copy_from_slice(&[103.0, 105.0]);
        assert_eq!(lik.linear_predictor(&theta), mu);
    }

    #[test]
    fn interaction_centering_is_overall_mean() {
        let layout = ParameterLayout::new(2, 2);
        let mut theta = vec![0.0; layout.dim()];
        layout
            .block_mut(&mut theta, EffectGroup::A1a2)
            .copy_from_slice(&[1.0, 2.0, 3.0, 6.0]);
        let effects = CenteredEffects::from_state(&layout, &theta);
        assert_eq!(effects.b1a2.as_slice(), &[-2.0, -1.0, 0.0, 3.0]);
    }

    #[test]
    fn log_density_matches_sum_of_normals() {
        let data = two_by_two();
        let layout = ParameterLayout::new(2, 2);
        let mut theta = vec![0.0; layout.dim()];
        theta[SIGMA] = 0.8;
        theta[A0] = 2.5;
        layout.block_mut(&mut theta, EffectGroup::A2).copy_from_slice(&[-0.5, 0.5]);
        let lik = Likelihood::new(&data, layout);

        let mu = lik.linear_predictor(&theta);
        let tau = 1.0 / (0.8 * 0.8);
        let expected: f64 = data
            .observations()
            .iter()
            .zip(&mu)
            .map(|(o, m)| normal_log_pdf_precision(o.value, *m, tau))
            .sum();
        assert!((lik.log_density(&theta) - expected).abs() < 1e-10);
    }

    #[test]
    fn non_positive_sigma_is_neg_inf() {
        let data = two_by_two();
        let layout = ParameterLayout::new(2, 2);
        let lik = Likelihood::new(&data, layout);
        let mut theta = vec![0.0; layout.dim()];
        assert_eq!(lik.log_density(&theta), f64::NEG_INFINITY);
        theta[SIGMA] = -1.0;
        assert_eq!(lik.log_density(&theta), f64::NEG_INFINITY);
        theta[SIGMA] = f64::NAN;
        assert_eq!(lik.log_density(&theta), f64::NEG_INFINITY);
    }
}
