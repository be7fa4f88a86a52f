//! Deterministic mode search used to pick the chain's starting point.
//!
//! Coordinate pattern search: every sweep visits each coordinate, tries `+step`
//! then `-step`, keeps the first move that raises the log density and grows that
//! coordinate's step, or halves the step when neither move helps. The search has
//! converged once every step is below the tolerance. It needs no gradients and
//! copes with `-inf` outside the support, which simply counts as "no improvement".

use banova_common::{Error, Result};
use serde::{Deserialize, Serialize};

use super::LogDensity;

const STEP_GROWTH: f64 = 1.2;
const STEP_SHRINK: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeSettings {
    /// Sweep budget.
    pub max_iterations: usize,
    /// Largest per-coordinate step at which the search stops.
    pub tolerance: f64,
    pub initial_step: f64,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-6,
            initial_step: 0.5,
        }
    }
}

/// Outcome of [`find_mode`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSearch {
    pub point: Vec<f64>,
    pub log_density: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Climb from `target.default_start()`.
///
/// Fails only when the starting point itself has no finite density; a search that
/// runs out of sweeps is reported through `converged = false`.
pub fn find_mode<T: LogDensity + ?Sized>(target: &T, settings: &ModeSettings) -> Result<ModeSearch> {
    let mut point = target.default_start();
    if point.len() != target.dim() {
        return Err(Error::Sampling(format!(
            "default start has {} coordinates, target has {}",
            point.len(),
            target.dim()
        )));
    }
    let mut lp = target.log_density(&point);
    if !lp.is_finite() {
        return Err(Error::Sampling(
            "log density is not finite at the default start".to_string(),
        ));
    }

    let mut steps = vec![settings.initial_step; point.len()];
    let mut iterations = 0;
    let mut converged = steps.iter().all(|s| *s < settings.tolerance);

    while !converged && iterations < settings.max_iterations {
        iterations += 1;
        for j in 0..point.len() {
            let original = point[j];
            let mut improved = false;
            for direction in [1.0, -1.0] {
                point[j] = original + direction * steps[j];
                let candidate = target.log_density(&point);
                if candidate.is_finite() && candidate > lp {
                    lp = candidate;
                    improved = true;
                    break;
                }
            }
            if improved {
                steps[j] *= STEP_GROWTH;
            } else {
                point[j] = original;
                steps[j] *= STEP_SHRINK;
            }
        }
        converged = steps.iter().all(|s| *s < settings.tolerance);
    }

    Ok(ModeSearch {
        point,
        log_density: lp,
        iterations,
        converged,
    })
}
