//! Markov chain sampling of the joint posterior.
//!
//! The sampler only sees a [`LogDensity`]: a dimension, an unnormalized log density
//! over flat state vectors, and a fallback starting point. Runs start from a
//! deterministic mode search ([`map::find_mode`]) and then take component-wise
//! random-walk Metropolis sweeps ([`metropolis::MetropolisSampler`]).

pub mod cancel;
pub mod map;
pub mod metropolis;

pub use cancel::CancelToken;
pub use map::{find_mode, ModeSearch, ModeSettings};
pub use metropolis::{MetropolisSampler, SamplerSettings};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Unnormalized log density over flat parameter vectors.
pub trait LogDensity {
    fn dim(&self) -> usize;

    /// `-inf` outside the support. Never NaN.
    fn log_density(&self, theta: &[f64]) -> f64;

    /// Fallback starting point when mode finding fails.
    fn default_start(&self) -> Vec<f64>;

    fn coordinate_names(&self) -> Vec<String> {
        (0..self.dim()).map(|i| format!("theta[{}]", i)).collect()
    }
}

/// Where the chain started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StartKind {
    /// Converged mode search.
    Mode,
    /// Prior-mean fallback after the mode search did not converge.
    Fallback,
}

/// Initialization provenance reported alongside the draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StartInfo {
    pub kind: StartKind,
    /// Mode-search sweeps used.
    pub iterations: usize,
    /// Log density at the starting point.
    pub log_density: f64,
}

/// A complete chain: exactly one state per iteration.
#[derive(Debug, Clone)]
pub struct Chain {
    dim: usize,
    draws: Vec<f64>,
    log_densities: Vec<f64>,
    accepted: Vec<u64>,
    proposed: Vec<u64>,
    proposal_scales: Vec<f64>,
    start: StartInfo,
}

impl Chain {
    pub(crate) fn with_capacity(dim: usize, len: usize, start: StartInfo) -> Self {
        Self {
            dim,
            draws: Vec::with_capacity(dim * len),
            log_densities: Vec::with_capacity(len),
            accepted: vec![0; dim],
            proposed: vec![0; dim],
            proposal_scales: Vec::new(),
            start,
        }
    }

    pub(crate) fn push(&mut self, state: &[f64], log_density: f64) {
        debug_assert_eq!(state.len(), self.dim);
        self.draws.extend_from_slice(state);
        self.log_densities.push(log_density);
    }

    pub(crate) fn record(&mut self, coordinate: usize, accepted: bool) {
        self.proposed[coordinate] += 1;
        if accepted {
            self.accepted[coordinate] += 1;
        }
    }

    pub(crate) fn set_proposal_scales(&mut self, scales: Vec<f64>) {
        self.proposal_scales = scales;
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.log_densities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_densities.is_empty()
    }

    /// State of iteration `i`.
    pub fn draw(&self, i: usize) -> &[f64] {
        &self.draws[i * self.dim..(i + 1) * self.dim]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.draws.chunks_exact(self.dim.max(1))
    }

    pub fn log_densities(&self) -> &[f64] {
        &self.log_densities
    }

    /// Per-coordinate acceptance rate over the whole run.
    pub fn acceptance_rates(&self) -> Vec<f64> {
        self.accepted
            .iter()
            .zip(&self.proposed)
            .map(|(a, p)| if *p == 0 { 0.0 } else { *a as f64 / *p as f64 })
            .collect()
    }

    /// Acceptance rate pooled over all coordinates.
    pub fn overall_acceptance(&self) -> f64 {
        let accepted: u64 = self.accepted.iter().sum();
        let proposed: u64 = self.proposed.iter().sum();
        if proposed == 0 {
            0.0
        } else {
            accepted as f64 / proposed as f64
        }
    }

    /// Proposal scales in effect after tuning froze.
    pub fn proposal_scales(&self) -> &[f64] {
        &self.proposal_scales
    }

    pub fn start(&self) -> &StartInfo {
        &self.start
    }
}
