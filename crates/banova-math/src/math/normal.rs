//! Normal distribution log densities.
//!
//! The hierarchical ANOVA model is written in precision form (`tau = 1/sd^2`),
//! so the precision parameterization is the primary entry point.

use super::stable::LN_2PI;

/// Log of the Normal PDF at x with mean `mu` and precision `tau`.
///
/// Returns NaN for NaN inputs and for a non-positive or non-finite precision.
pub fn normal_log_pdf_precision(x: f64, mu: f64, tau: f64) -> f64 {
    if x.is_nan() || mu.is_nan() || tau.is_nan() {
        return f64::NAN;
    }
    if tau <= 0.0 || tau.is_infinite() {
        return f64::NAN;
    }
    let d = x - mu;
    0.5 * (tau.ln() - LN_2PI) - 0.5 * tau * d * d
}

/// Log of the Normal PDF at x with mean `mu` and standard deviation `sd`.
pub fn normal_log_pdf(x: f64, mu: f64, sd: f64) -> f64 {
    if sd.is_nan() || sd <= 0.0 {
        return f64::NAN;
    }
    normal_log_pdf_precision(x, mu, 1.0 / (sd * sd))
}

/// Joint log density of i.i.d. zero-mean Normal draws sharing one precision.
///
/// Equivalent to summing [`normal_log_pdf_precision`] over `values` with
/// `mu = 0`, without recomputing the normalizer per element.
pub fn iid_zero_mean_normal_log_pdf(values: &[f64], tau: f64) -> f64 {
    if tau.is_nan() || tau <= 0.0 || tau.is_infinite() {
        return f64::NAN;
    }
    let sum_sq: f64 = values.iter().map(|v| v * v).sum();
    0.5 * values.len() as f64 * (tau.ln() - LN_2PI) - 0.5 * tau * sum_sq
}
