//! Effect containers and the sum-to-zero centering transform.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Dense row-major matrix of interaction effects (`x1` levels by `x2` levels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EffectMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl EffectMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    /// Wrap row-major values. Returns `None` when the length is not `rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, values: Vec<f64>) -> Option<Self> {
        if values.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, values })
    }

    /// Outer product `u vᵀ`.
    pub fn outer(u: &[f64], v: &[f64]) -> Self {
        let values = u
            .iter()
            .flat_map(|a| v.iter().map(move |b| a * b))
            .collect();
        Self {
            rows: u.len(),
            cols: v.len(),
            values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Centered by the single overall mean of all cells.
    ///
    /// Row and column sums of the result are not zero in general.
    pub fn centered(&self) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            values: center(&self.values),
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// Full tensor contraction `Σᵢⱼ selfᵢⱼ otherᵢⱼ`. Shapes must agree.
    pub fn contract(&self, other: &EffectMatrix) -> f64 {
        debug_assert_eq!(self.shape(), other.shape());
        dot(&self.values, &other.values)
    }
}

/// `values - mean(values)`. Empty input stays empty.
pub fn center(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| v - m).collect()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
