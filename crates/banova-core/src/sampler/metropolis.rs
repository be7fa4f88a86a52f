//! Component-wise random-walk Metropolis.
//!
//! One iteration sweeps every coordinate in order: propose
//! `theta_j + s_j * N(0, 1)`, accept with probability `min(1, exp(lp' - lp))`, and
//! append exactly one state to the chain once the sweep is done. Proposals whose
//! log density is not finite are rejected without consuming a uniform draw.
//!
//! Per-coordinate proposal scales adapt every `tune_interval` iterations while
//! tuning is active, using the acceptance-rate ladder below, and are frozen after.

use banova_common::{Error, Result};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use super::cancel::CancelToken;
use super::map::{find_mode, ModeSettings};
use super::{Chain, LogDensity, StartInfo, StartKind};
use crate::logging::event_names;

/// Sampler knobs. Validated by [`MetropolisSampler::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Iterations to run; the chain holds exactly this many states.
    pub chain_length: usize,
    pub initial_proposal_scale: f64,
    /// Iterations between scale updates. Zero disables tuning.
    pub tune_interval: usize,
    /// Tuning is active for the first `tune_steps` iterations.
    pub tune_steps: usize,
    /// Consecutive non-finite proposals tolerated before giving up.
    pub max_invalid_streak: usize,
    /// Iterations between progress log lines. Zero disables them.
    pub progress_interval: usize,
    pub mode: ModeSettings,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            chain_length: 20_000,
            initial_proposal_scale: 0.1,
            tune_interval: 100,
            tune_steps: 2_000,
            max_invalid_streak: 100_000,
            progress_interval: 1_000,
            mode: ModeSettings::default(),
        }
    }
}

/// Multiplier applied to a proposal scale given the acceptance rate over the last
/// tuning window.
pub fn tune_factor(acceptance_rate: f64) -> f64 {
    if acceptance_rate < 0.001 {
        0.1
    } else if acceptance_rate < 0.05 {
        0.5
    } else if acceptance_rate < 0.2 {
        0.9
    } else if acceptance_rate > 0.95 {
        10.0
    } else if acceptance_rate > 0.75 {
        2.0
    } else if acceptance_rate > 0.5 {
        1.1
    } else {
        1.0
    }
}

#[derive(Debug, Clone)]
pub struct MetropolisSampler {
    settings: SamplerSettings,
}

impl MetropolisSampler {
    pub fn new(settings: SamplerSettings) -> Result<Self> {
        if settings.chain_length == 0 {
            return Err(Error::InvalidConfigValue {
                field: "chain_length".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(settings.initial_proposal_scale > 0.0 && settings.initial_proposal_scale.is_finite()) {
            return Err(Error::InvalidConfigValue {
                field: "initial_proposal_scale".to_string(),
                message: format!(
                    "must be positive and finite, got {}",
                    settings.initial_proposal_scale
                ),
            });
        }
        if settings.max_invalid_streak == 0 {
            return Err(Error::InvalidConfigValue {
                field: "max_invalid_streak".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Mode search, falling back to the target's default start when it does not
    /// converge.
    pub fn initialize<T: LogDensity + ?Sized>(&self, target: &T) -> Result<(Vec<f64>, StartInfo)> {
        let search = find_mode(target, &self.settings.mode)?;
        if search.converged {
            tracing::info!(
                target: event_names::OPTIMIZE_CONVERGED,
                iterations = search.iterations,
                log_density = search.log_density,
                "mode search converged"
            );
            return Ok((
                search.point,
                StartInfo {
                    kind: StartKind::Mode,
                    iterations: search.iterations,
                    log_density: search.log_density,
                },
            ));
        }

        tracing::warn!(
            target: event_names::OPTIMIZE_FALLBACK,
            iterations = search.iterations,
            "mode search did not converge, starting from prior means"
        );
        let start = target.default_start();
        let lp = target.log_density(&start);
        if !lp.is_finite() {
            return Err(Error::Sampling(
                "log density is not finite at the fallback start".to_string(),
            ));
        }
        Ok((
            start,
            StartInfo {
                kind: StartKind::Fallback,
                iterations: search.iterations,
                log_density: lp,
            },
        ))
    }

    /// Initialize, then run the full chain.
    pub fn sample<T, R>(&self, target: &T, rng: &mut R, cancel: &CancelToken) -> Result<Chain>
    where
        T: LogDensity + ?Sized,
        R: Rng,
    {
        let (start, info) = self.initialize(target)?;
        self.sample_from(target, start, info, rng, cancel)
    }

    /// Run the chain from an explicit starting state.
    pub fn sample_from<T, R>(
        &self,
        target: &T,
        start: Vec<f64>,
        info: StartInfo,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> Result<Chain>
    where
        T: LogDensity + ?Sized,
        R: Rng,
    {
        let s = &self.settings;
        let dim = target.dim();
        if start.len() != dim {
            return Err(Error::Sampling(format!(
                "starting state has {} coordinates, target has {}",
                start.len(),
                dim
            )));
        }

        let mut state = start;
        let mut lp = target.log_density(&state);
        if !lp.is_finite() {
            return Err(Error::Sampling(
                "log density is not finite at the starting state".to_string(),
            ));
        }

        let mut scales = vec![s.initial_proposal_scale; dim];
        let mut window_accepts = vec![0u64; dim];
        let mut invalid_streak = 0usize;
        let mut chain = Chain::with_capacity(dim, s.chain_length, info);

        tracing::info!(
            target: event_names::SAMPLE_STARTED,
            chain_length = s.chain_length,
            dim,
            start_log_density = lp,
            "sampling started"
        );

        for iteration in 0..s.chain_length {
            if cancel.is_cancelled() {
                tracing::warn!(
                    target: event_names::SAMPLE_CANCELLED,
                    completed = iteration,
                    requested = s.chain_length,
                    "sampling cancelled"
                );
                return Err(Error::Cancelled {
                    completed: iteration,
                    requested: s.chain_length,
                });
            }

            for j in 0..dim {
                let current = state[j];
                let z: f64 = StandardNormal.sample(rng);
                state[j] = current + scales[j] * z;
                let proposed = target.log_density(&state);

                let accepted = if proposed.is_finite() {
                    invalid_streak = 0;
                    let u: f64 = rng.random();
                    u.ln() < proposed - lp
                } else {
                    invalid_streak += 1;
                    false
                };

                if accepted {
                    lp = proposed;
                    window_accepts[j] += 1;
                } else {
                    state[j] = current;
                }
                chain.record(j, accepted);

                if invalid_streak >= s.max_invalid_streak {
                    return Err(Error::Sampling(format!(
                        "{} consecutive proposals had no finite log density (iteration {})",
                        invalid_streak, iteration
                    )));
                }
            }
            chain.push(&state, lp);

            let done = iteration + 1;
            if s.tune_interval > 0 && done <= s.tune_steps && done % s.tune_interval == 0 {
                for (scale, accepts) in scales.iter_mut().zip(window_accepts.iter_mut()) {
                    *scale *= tune_factor(*accepts as f64 / s.tune_interval as f64);
                    *accepts = 0;
                }
                if done + s.tune_interval > s.tune_steps {
                    tracing::debug!(
                        target: event_names::SAMPLE_TUNED,
                        iteration = done,
                        "proposal scales frozen"
                    );
                }
            }

            if s.progress_interval > 0 && done % s.progress_interval == 0 {
                tracing::debug!(
                    target: event_names::SAMPLE_PROGRESS,
                    iteration = done,
                    requested = s.chain_length,
                    log_density = lp,
                    acceptance = chain.overall_acceptance(),
                    "sampler progress"
                );
            }
        }

        chain.set_proposal_scales(scales);
        tracing::info!(
            target: event_names::SAMPLE_FINISHED,
            iterations = chain.len(),
            acceptance = chain.overall_acceptance(),
            "sampling finished"
        );
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::testing::{Gaussian, HalfLine};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn settings(chain_length: usize) -> SamplerSettings {
        SamplerSettings {
            chain_length,
            tune_steps: chain_length / 10,
            ..SamplerSettings::default()
        }
    }

    fn run<T: LogDensity>(target: &T, chain_length: usize, seed: u64) -> Chain {
        let sampler = MetropolisSampler::new(settings(chain_length)).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        sampler.sample(target, &mut rng, &CancelToken::new()).unwrap()
    }

    fn gaussian() -> Gaussian {
        Gaussian {
            means: vec![1.5, -0.5],
            sds: vec![1.0, 0.5],
        }
    }

    #[test]
    fn chain_has_exactly_requested_length() {
        let chain = run(&gaussian(), 250, 1);
        assert_eq!(chain.len(), 250);
        assert_eq!(chain.dim(), 2);
        assert_eq!(chain.proposal_scales().len(), 2);
        assert_eq!(chain.start().kind, StartKind::Mode);
    }

    #[test]
    fn same_seed_same_chain() {
        let a = run(&gaussian(), 300, 7);
        let b = run(&gaussian(), 300, 7);
        for i in 0..300 {
            assert_eq!(a.draw(i), b.draw(i));
        }
        assert_eq!(a.log_densities(), b.log_densities());
    }

    #[test]
    fn different_seeds_diverge() {
        let a = run(&gaussian(), 300, 7);
        let b = run(&gaussian(), 300, 8);
        assert!((0..300).any(|i| a.draw(i) != b.draw(i)));
    }

    #[test]
    fn recovers_gaussian_means() {
        let target = gaussian();
        let chain = run(&target, 20_000, 42);
        for (j, mean) in target.means.iter().enumerate() {
            let xs: Vec<f64> = chain.iter().skip(2_000).map(|d| d[j]).collect();
            let m = banova_math::mean(&xs);
            assert!((m - mean).abs() < 0.15, "coordinate {}: {} vs {}", j, m, mean);
        }
        let rate = chain.overall_acceptance();
        assert!(rate > 0.05 && rate < 0.95, "acceptance {}", rate);
    }

    #[test]
    fn never_leaves_support() {
        let chain = run(&HalfLine, 2_000, 3);
        assert!(chain.iter().all(|d| d[0] > 0.0));
    }

    #[test]
    fn cancelled_token_aborts_without_result() {
        let sampler = MetropolisSampler::new(settings(100)).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let token = CancelToken::new();
        token.cancel();
        let err = sampler.sample(&gaussian(), &mut rng, &token).unwrap_err();
        match err {
            Error::Cancelled {
                completed,
                requested,
            } => {
                assert_eq!(completed, 0);
                assert_eq!(requested, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Finite only at the origin, so every proposal is invalid.
    struct Spike;

    impl LogDensity for Spike {
        fn dim(&self) -> usize {
            1
        }
        fn log_density(&self, theta: &[f64]) -> f64 {
            if theta[0] == 0.0 {
                0.0
            } else {
                f64::NEG_INFINITY
            }
        }
        fn default_start(&self) -> Vec<f64> {
            vec![0.0]
        }
    }

    #[test]
    fn invalid_streak_is_fatal() {
        let sampler = MetropolisSampler::new(SamplerSettings {
            max_invalid_streak: 10,
            ..settings(100)
        })
        .unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let err = sampler
            .sample(&Spike, &mut rng, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Sampling(_)));
    }

    #[test]
    fn start_with_wrong_dimension_is_rejected() {
        let sampler = MetropolisSampler::new(settings(10)).unwrap();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let info = StartInfo {
            kind: StartKind::Fallback,
            iterations: 0,
            log_density: 0.0,
        };
        let err = sampler
            .sample_from(&gaussian(), vec![0.0], info, &mut rng, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Error::Sampling(_)));
    }

    #[test]
    fn unconverged_search_falls_back() {
        let sampler = MetropolisSampler::new(SamplerSettings {
            mode: ModeSettings {
                max_iterations: 1,
                ..ModeSettings::default()
            },
            ..settings(10)
        })
        .unwrap();
        let target = gaussian();
        let (start, info) = sampler.initialize(&target).unwrap();
        assert_eq!(info.kind, StartKind::Fallback);
        assert_eq!(start, target.default_start());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(MetropolisSampler::new(settings(0)).is_err());
        assert!(MetropolisSampler::new(SamplerSettings {
            initial_proposal_scale: 0.0,
            ..SamplerSettings::default()
        })
        .is_err());
    }

    #[test]
    fn tuning_ladder() {
        assert_eq!(tune_factor(0.0), 0.1);
        assert_eq!(tune_factor(0.01), 0.5);
        assert_eq!(tune_factor(0.1), 0.9);
        assert_eq!(tune_factor(0.3), 1.0);
        assert_eq!(tune_factor(0.6), 1.1);
        assert_eq!(tune_factor(0.8), 2.0);
        assert_eq!(tune_factor(0.99), 10.0);
    }
}
