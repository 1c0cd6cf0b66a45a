//! Price Inference Engine
//!
//! Loads the trained regressor (ONNX through tract, or a JSON model
//! artifact) and runs the prepare → scale → predict pipeline.

mod card;
mod engine;
mod model;
mod predictor;

pub use card::{format_currency, ModelCard};
pub use engine::{InferenceEngine, Regressor};
pub use model::{LinearModel, ModelArtifact, Tree, TreeEnsemble, TreeNode};
pub use predictor::{EstimateError, PriceEstimate, PricePredictor, Severity};

use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),
}
