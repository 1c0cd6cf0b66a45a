//! Inference Engine Implementation

use crate::model::ModelArtifact;
use crate::InferenceError;
use feature_engine::FEATURE_DIMENSION;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

/// Produces a price from one scaled feature row
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, InferenceError>;

    /// Backend name for health and logging
    fn name(&self) -> &str;
}

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

enum Backend {
    Onnx(OnnxPlan),
    Json(ModelArtifact),
}

/// Regression model loaded once at startup
pub struct InferenceEngine {
    backend: Backend,
}

impl InferenceEngine {
    /// Load a model artifact, picking the backend from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading inference model from {}", path.display());

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let backend = match extension.as_deref() {
            Some("onnx") => Backend::Onnx(load_onnx(path)?),
            Some("json") => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    InferenceError::ModelLoadError(format!("{}: {}", path.display(), e))
                })?;
                Backend::Json(ModelArtifact::from_json(&raw, FEATURE_DIMENSION)?)
            }
            _ => {
                return Err(InferenceError::UnsupportedFormat(
                    path.display().to_string(),
                ))
            }
        };

        let engine = Self { backend };
        info!("Model loaded successfully ({} backend)", engine.name());
        Ok(engine)
    }

    /// Wrap an in-memory model artifact
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, InferenceError> {
        artifact.check(FEATURE_DIMENSION)?;
        Ok(Self {
            backend: Backend::Json(artifact),
        })
    }
}

impl Regressor for InferenceEngine {
    fn predict(&self, features: &[f64]) -> Result<f64, InferenceError> {
        if features.len() != FEATURE_DIMENSION {
            return Err(InferenceError::InvalidInputShape {
                expected: FEATURE_DIMENSION,
                actual: features.len(),
            });
        }

        let value = match &self.backend {
            Backend::Onnx(plan) => run_onnx(plan, features)?,
            Backend::Json(artifact) => artifact.evaluate(features),
        };

        if !value.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "Model produced non-finite output {}",
                value
            )));
        }

        debug!("Raw model output: {}", value);
        Ok(value)
    }

    fn name(&self) -> &str {
        match &self.backend {
            Backend::Onnx(_) => "onnx",
            Backend::Json(artifact) => artifact.kind(),
        }
    }
}

fn load_onnx(path: &Path) -> Result<OnnxPlan, InferenceError> {
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|model| model.with_input_fact(0, f32::fact([1, FEATURE_DIMENSION]).into()))
        .and_then(|model| model.into_optimized())
        .and_then(|model| model.into_runnable())
        .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))
}

fn run_onnx(plan: &OnnxPlan, features: &[f64]) -> Result<f64, InferenceError> {
    let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();

    let input = Tensor::from_shape(&[1, FEATURE_DIMENSION], &row)
        .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
    let outputs = plan
        .run(tvec!(input.into()))
        .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

    let output = outputs
        .first()
        .ok_or_else(|| InferenceError::InferenceFailed("Model returned no outputs".to_string()))?;
    let output = output
        .cast_to::<f32>()
        .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
    let values = output
        .as_slice::<f32>()
        .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

    values
        .first()
        .map(|&v| v as f64)
        .ok_or_else(|| InferenceError::InferenceFailed("Model returned an empty tensor".to_string()))
}
