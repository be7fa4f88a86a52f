//! Flat parameter vector layout.
//!
//! The sampler works on one `Vec<f64>` per state. Coordinates are laid out as
//!
//! ```text
//! [u_a1, u_a2, u_a1a2, sigma, a0, a1[0..n1], a2[0..n2], a1a2[0..n1*n2] (row-major)]
//! ```
//!
//! where `u_g` are the unabsoluted hyper variables behind each HyperScale.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::effects::EffectMatrix;

/// Level-indexed effect groups, each with its own HyperScale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EffectGroup {
    A1,
    A2,
    A1a2,
}

impl EffectGroup {
    pub const ALL: [EffectGroup; 3] = [EffectGroup::A1, EffectGroup::A2, EffectGroup::A1a2];

    pub fn name(self) -> &'static str {
        match self {
            EffectGroup::A1 => "a1",
            EffectGroup::A2 => "a2",
            EffectGroup::A1a2 => "a1a2",
        }
    }
}

impl std::fmt::Display for EffectGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Declared shape of a parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Vector(usize),
    Matrix(usize, usize),
}

impl Shape {
    pub fn len(self) -> usize {
        match self {
            Shape::Vector(n) => n,
            Shape::Matrix(r, c) => r * c,
        }
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Vector(n) => write!(f, "[{}]", n),
            Shape::Matrix(r, c) => write!(f, "[{}, {}]", r, c),
        }
    }
}

pub const HYPER_A1: usize = 0;
pub const HYPER_A2: usize = 1;
pub const HYPER_A1A2: usize = 2;
pub const SIGMA: usize = 3;
pub const A0: usize = 4;
const EFFECTS_START: usize = 5;

/// Offsets of every parameter block inside a state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterLayout {
    levels1: usize,
    levels2: usize,
}

impl ParameterLayout {
    pub fn new(levels1: usize, levels2: usize) -> Self {
        Self { levels1, levels2 }
    }

    pub fn levels1(&self) -> usize {
        self.levels1
    }

    pub fn levels2(&self) -> usize {
        self.levels2
    }

    pub fn dim(&self) -> usize {
        EFFECTS_START + self.levels1 + self.levels2 + self.levels1 * self.levels2
    }

    /// Shape the dataset requires for a group.
    pub fn shape(&self, group: EffectGroup) -> Shape {
        match group {
            EffectGroup::A1 => Shape::Vector(self.levels1),
            EffectGroup::A2 => Shape::Vector(self.levels2),
            EffectGroup::A1a2 => Shape::Matrix(self.levels1, self.levels2),
        }
    }

    pub fn hyper_index(&self, group: EffectGroup) -> usize {
        match group {
            EffectGroup::A1 => HYPER_A1,
            EffectGroup::A2 => HYPER_A2,
            EffectGroup::A1a2 => HYPER_A1A2,
        }
    }

    fn range(&self, group: EffectGroup) -> std::ops::Range<usize> {
        let a2_start = EFFECTS_START + self.levels1;
        let a1a2_start = a2_start + self.levels2;
        match group {
            EffectGroup::A1 => EFFECTS_START..a2_start,
            EffectGroup::A2 => a2_start..a1a2_start,
            EffectGroup::A1a2 => a1a2_start..self.dim(),
        }
    }

    /// The raw coefficients of a group (row-major for the interaction).
    pub fn block<'a>(&self, theta: &'a [f64], group: EffectGroup) -> &'a [f64] {
        &theta[self.range(group)]
    }

    pub fn block_mut<'a>(&self, theta: &'a mut [f64], group: EffectGroup) -> &'a mut [f64] {
        let range = self.range(group);
        &mut theta[range]
    }

    pub fn interaction(&self, theta: &[f64]) -> EffectMatrix {
        let values = self.block(theta, EffectGroup::A1a2).to_vec();
        EffectMatrix::from_row_major(self.levels1, self.levels2, values)
            .unwrap_or_else(|| EffectMatrix::zeros(self.levels1, self.levels2))
    }

    /// Human-readable coordinate names, e.g. `a1a2[1,0]`.
    pub fn coordinate_names(&self) -> Vec<String> {
        let mut names = vec![
            "a1_sd_unabs".to_string(),
            "a2_sd_unabs".to_string(),
            "a1a2_sd_unabs".to_string(),
            "sigma".to_string(),
            "a0".to_string(),
        ];
        names.extend((0..self.levels1).map(|i| format!("a1[{}]", i)));
        names.extend((0..self.levels2).map(|j| format!("a2[{}]", j)));
        for i in 0..self.levels1 {
            names.extend((0..self.levels2).map(|j| format!("a1a2[{},{}]", i, j)));
        }
        names
    }
}
