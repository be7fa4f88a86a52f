//! Input data: validated two-factor datasets and response standardization.

pub mod dataset;
pub mod document;
pub mod standardize;

pub use dataset::{Dataset, Factor, Observation};
pub use document::{DataDocument, ResponseTransform};
pub use standardize::Standardizer;
