//! banova core library
//!
//! Bayesian two-factor hierarchical ANOVA:
//! - Dataset validation and response standardization
//! - Hierarchical prior and normal likelihood over a flat parameter layout
//! - Mode search plus component-wise Metropolis sampling
//! - Posterior processing back to the original response scale
//! - Contrast evaluation and posterior summaries
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod contrast;
pub mod data;
pub mod exit_codes;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod posterior;
pub mod report;
pub mod sampler;
pub mod schema;
pub mod summary;

pub use pipeline::{run_analysis, Analysis, Pipeline};
