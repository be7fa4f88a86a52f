//! Response standardization and its inverse.
//!
//! The model's priors (`a0` precision 0.001, `sigma ~ Uniform(0, 10)`) are only
//! sensible on a unit-variance scale, so every response is z-scored before model
//! construction and posterior draws are mapped back afterwards.

use banova_common::{Error, Result};
use banova_math::{mean, population_std};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The affine transform `z = (y - mean) / std`.
///
/// Uses the population standard deviation (divisor `n`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Standardizer {
    mean: f64,
    std: f64,
}

impl Standardizer {
    /// Fit the transform to a response array.
    ///
    /// Fails with `DataValidation` for fewer than two values, non-finite values,
    /// or zero variance.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(Error::DataValidation(format!(
                "response needs at least 2 values, got {}",
                values.len()
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::DataValidation(format!(
                "response value {} at position {} is not finite",
                values[pos], pos
            )));
        }
        let mean = mean(values);
        let std = population_std(values);
        // Summation rounding can leave a constant response with a std of a few ulps.
        let constant = values.iter().all(|v| *v == values[0]);
        if constant || !std.is_finite() || std <= 4.0 * f64::EPSILON * mean.abs() {
            return Err(Error::DataValidation(format!(
                "response has zero variance (all {} values equal {})",
                values.len(),
                values[0]
            )));
        }
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std(&self) -> f64 {
        self.std
    }

    pub fn standardize(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    pub fn standardize_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.standardize(*v)).collect()
    }

    /// Map a standardized location back to response units.
    pub fn invert(&self, z: f64) -> f64 {
        z * self.std + self.mean
    }

    /// Map a standardized difference or scale back to response units.
    ///
    /// Effects are differences between levels, so the mean shift cancels.
    pub fn rescale_effect(&self, z: f64) -> f64 {
        z * self.std
    }
}
