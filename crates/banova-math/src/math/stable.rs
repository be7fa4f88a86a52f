//! Numerically stable primitives for log-domain Bayesian math.

use std::f64::consts::PI;

/// ln(2*pi).
pub const LN_2PI: f64 = 1.837_877_066_409_345_5;

const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8; // 0.5 * ln(2*pi)
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)] // These are published numerical constants
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// `ln |Gamma(z)|` for real `z`.
///
/// Lanczos series for `z >= 0.5`, Euler reflection below. Poles (zero and the
/// negative integers) and `-inf` give NaN.
pub fn log_gamma(z: f64) -> f64 {
    match z {
        z if z.is_nan() || z == f64::NEG_INFINITY => f64::NAN,
        z if z == f64::INFINITY => f64::INFINITY,
        z if z >= 0.5 => lanczos_log_gamma(z),
        z => {
            let sin_pi = (PI * z).sin();
            if z.fract() == 0.0 || sin_pi == 0.0 {
                return f64::NAN;
            }
            PI.ln() - sin_pi.abs().ln() - lanczos_log_gamma(1.0 - z)
        }
    }
}

fn lanczos_log_gamma(z: f64) -> f64 {
    let shifted = z - 1.0;
    let series = LANCZOS_COEFFS[1..]
        .iter()
        .zip(1..)
        .fold(LANCZOS_COEFFS[0], |acc, (c, k)| acc + c / (shifted + f64::from(k)));
    let t = shifted + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (shifted + 0.5) * t.ln() - t + series.ln()
}

/// Collapse a log density to `-inf` unless it is a finite number.
///
/// Samplers compare log densities with `<`, so NaN and `+inf` (both symptoms of
/// overflow, e.g. a precision of `1/0`) must never leak into an acceptance test.
pub fn finite_or_neg_inf(log_density: f64) -> f64 {
    if log_density.is_finite() {
        log_density
    } else {
        f64::NEG_INFINITY
    }
}

/// Sum of log-density terms with early exit once a term is not finite.
pub fn sum_log_terms<I>(terms: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut total = 0.0;
    for term in terms {
        if !term.is_finite() {
            return f64::NEG_INFINITY;
        }
        total += term;
    }
    finite_or_neg_inf(total)
}
