//! Continuous uniform log density.

/// Log of the Uniform(lower, upper) PDF at x.
///
/// The support is the open interval `(lower, upper)`: a residual scale of exactly
/// zero is outside the support rather than a point of infinite precision.
pub fn uniform_log_pdf(x: f64, lower: f64, upper: f64) -> f64 {
    if x.is_nan() || lower.is_nan() || upper.is_nan() {
        return f64::NAN;
    }
    if upper <= lower {
        return f64::NAN;
    }
    if x <= lower || x >= upper {
        return f64::NEG_INFINITY;
    }
    -(upper - lower).ln()
}

/// Mean of Uniform(lower, upper).
pub fn uniform_mean(lower: f64, upper: f64) -> f64 {
    0.5 * (lower + upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_support() {
        assert!((uniform_log_pdf(3.0, 0.0, 10.0) + 10.0f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn boundaries_are_excluded() {
        assert_eq!(uniform_log_pdf(0.0, 0.0, 10.0), f64::NEG_INFINITY);
        assert_eq!(uniform_log_pdf(10.0, 0.0, 10.0), f64::NEG_INFINITY);
        assert_eq!(uniform_log_pdf(-0.1, 0.0, 10.0), f64::NEG_INFINITY);
    }

    #[test]
    fn degenerate_interval_is_nan() {
        assert!(uniform_log_pdf(1.0, 2.0, 2.0).is_nan());
    }

    #[test]
    fn mean_is_midpoint() {
        assert_eq!(uniform_mean(0.0, 10.0), 5.0);
    }
}
