//! Student's t distribution in precision parameterization.
//!
//! `StudentT(nu, mu, lambda)` has density
//!
//! ```text
//! f(x) = Γ((ν+1)/2) / Γ(ν/2) * sqrt(λ / (πν)) * (1 + λ(x-μ)²/ν)^(-(ν+1)/2)
//! ```
//!
//! With `ν = 1` this is a Cauchy distribution with scale `1/sqrt(λ)`, which is the
//! heavy-tailed hyperprior used for the ANOVA effect scales.

use std::f64::consts::PI;

use super::stable::log_gamma;

/// Log of the Student's t PDF at x.
///
/// # Arguments
/// * `nu` - degrees of freedom (ν > 0)
/// * `mu` - location
/// * `lambda` - precision (λ > 0), i.e. `1/scale²`
pub fn student_t_log_pdf(x: f64, nu: f64, mu: f64, lambda: f64) -> f64 {
    if x.is_nan() || nu.is_nan() || mu.is_nan() || lambda.is_nan() {
        return f64::NAN;
    }
    if nu <= 0.0 || lambda <= 0.0 || lambda.is_infinite() {
        return f64::NAN;
    }
    if x.is_infinite() {
        return f64::NEG_INFINITY;
    }
    let d = x - mu;
    let half_nu_plus = 0.5 * (nu + 1.0);
    log_gamma(half_nu_plus) - log_gamma(0.5 * nu) + 0.5 * (lambda / (PI * nu)).ln()
        - half_nu_plus * (lambda * d * d / nu).ln_1p()
}
