//! Descriptive statistics over posterior draws.
//!
//! All functions treat their input as an unordered bag of draws. Empty input
//! yields NaN (or `None` for intervals) rather than panicking.

use serde::{Deserialize, Serialize};

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divisor `n`).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `n`).
pub fn population_std(values: &[f64]) -> f64 {
    population_variance(values).sqrt()
}

/// Quantile with linear interpolation between order statistics.
///
/// `q` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() || q.is_nan() {
        return f64::NAN;
    }
    let sorted = sorted_copy(values);
    quantile_sorted(&sorted, q)
}

/// Median (0.5 quantile).
pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// A closed credible interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }
}

/// Highest density interval of a sample.
///
/// Scans every window of `floor(mass * n)` consecutive order statistics and
/// returns the narrowest. Ties resolve to the lowest window.
pub fn hdi(values: &[f64], mass: f64) -> Option<Interval> {
    if values.is_empty() || !(mass > 0.0 && mass <= 1.0) {
        return None;
    }
    let sorted = sorted_copy(values);
    let n = sorted.len();
    let span = ((mass * n as f64).floor() as usize).min(n - 1);
    let windows = n - span;

    let mut best = 0;
    let mut best_width = f64::INFINITY;
    for i in 0..windows {
        let width = sorted[i + span] - sorted[i];
        if width < best_width {
            best_width = width;
            best = i;
        }
    }
    Some(Interval {
        lower: sorted[best],
        upper: sorted[best + span],
    })
}

/// Fraction of values strictly below `threshold`.
pub fn fraction_below(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().filter(|v| **v < threshold).count() as f64 / values.len() as f64
}
