//! Feature Engineering Engine
//!
//! Turns raw property inputs into the fixed-order feature vector the model
//! expects, and applies the fitted scaler to it.

mod features;
mod scaler;

pub use features::{
    prepare, FeaturePreparer, FeatureVector, PropertyFeatures, FEATURE_DIMENSION, FEATURE_NAMES,
};
pub use scaler::{FittedScaler, ScaledFeatures, Scaler, ScalingMethod};

use thiserror::Error;

/// Errors while loading or applying a scaler
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("Failed to read scaler artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scaler artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Scaler parameter {parameter} has {actual} values, expected {expected}")]
    DimensionMismatch {
        parameter: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Scaler feature order mismatch: expected {expected:?}, got {actual:?}")]
    FeatureOrder {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}
