//! Fitted Feature Scaling

use crate::features::{FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES};
use crate::ScalerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Scaled feature values, in the same order as [`FeatureVector::values`]
pub type ScaledFeatures = [f64; FEATURE_DIMENSION];

/// Transforms a prepared feature vector into the space the model was trained in
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &FeatureVector) -> Result<ScaledFeatures, ScalerError>;

    /// Scaling method name for health and model details
    fn name(&self) -> &str;
}

/// Scaling method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    /// Z-score using fitted mean and scale
    Standard,
    /// Min-max to [0, 1] using fitted bounds
    MinMax,
    /// No scaling
    Identity,
}

impl ScalingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingMethod::Standard => "standard",
            ScalingMethod::MinMax => "min_max",
            ScalingMethod::Identity => "identity",
        }
    }
}

/// Below this a fitted scale or range counts as zero
const MIN_SCALE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScalerParams {
    Standard {
        mean: ScaledFeatures,
        scale: ScaledFeatures,
    },
    MinMax {
        min: ScaledFeatures,
        max: ScaledFeatures,
    },
    Identity,
}

/// On-disk layout of a scaler artifact
#[derive(Debug, Serialize, Deserialize)]
struct ScalerArtifact {
    method: ScalingMethod,
    /// Columns the scaler was fitted on
    feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    mean: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    min: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    max: Vec<f64>,
}

/// Scaler with parameters fitted offline, loaded from a JSON artifact.
///
/// Deserializing checks the column order and parameter lengths, so every
/// value of this type has one fitted parameter per feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScalerArtifact", into = "ScalerArtifact")]
pub struct FittedScaler {
    params: ScalerParams,
}

impl FittedScaler {
    /// Standard scaler from fitted mean and scale
    pub fn standard(mean: ScaledFeatures, scale: ScaledFeatures) -> Self {
        Self {
            params: ScalerParams::Standard { mean, scale },
        }
    }

    /// Min-max scaler from fitted bounds
    pub fn min_max(min: ScaledFeatures, max: ScaledFeatures) -> Self {
        Self {
            params: ScalerParams::MinMax { min, max },
        }
    }

    /// Passthrough scaler
    pub fn identity() -> Self {
        Self {
            params: ScalerParams::Identity,
        }
    }

    /// Load and check a scaler artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScalerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let scaler = Self::from_json(&raw)?;
        info!(
            "Loaded {} scaler from {}",
            scaler.method().as_str(),
            path.display()
        );
        Ok(scaler)
    }

    /// Parse and check a scaler artifact
    pub fn from_json(raw: &str) -> Result<Self, ScalerError> {
        let artifact: ScalerArtifact = serde_json::from_str(raw)?;
        Self::try_from(artifact)
    }

    /// Get scaling method
    pub fn method(&self) -> ScalingMethod {
        match self.params {
            ScalerParams::Standard { .. } => ScalingMethod::Standard,
            ScalerParams::MinMax { .. } => ScalingMethod::MinMax,
            ScalerParams::Identity => ScalingMethod::Identity,
        }
    }
}

impl TryFrom<ScalerArtifact> for FittedScaler {
    type Error = ScalerError;

    fn try_from(artifact: ScalerArtifact) -> Result<Self, Self::Error> {
        if artifact.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ScalerError::FeatureOrder {
                expected: default_feature_names(),
                actual: artifact.feature_names,
            });
        }

        let params = match artifact.method {
            ScalingMethod::Standard => ScalerParams::Standard {
                mean: fitted("mean", artifact.mean)?,
                scale: fitted("scale", artifact.scale)?,
            },
            ScalingMethod::MinMax => ScalerParams::MinMax {
                min: fitted("min", artifact.min)?,
                max: fitted("max", artifact.max)?,
            },
            ScalingMethod::Identity => ScalerParams::Identity,
        };
        Ok(Self { params })
    }
}

impl From<FittedScaler> for ScalerArtifact {
    fn from(scaler: FittedScaler) -> Self {
        let mut artifact = ScalerArtifact {
            method: scaler.method(),
            feature_names: default_feature_names(),
            mean: Vec::new(),
            scale: Vec::new(),
            min: Vec::new(),
            max: Vec::new(),
        };
        match scaler.params {
            ScalerParams::Standard { mean, scale } => {
                artifact.mean = mean.to_vec();
                artifact.scale = scale.to_vec();
            }
            ScalerParams::MinMax { min, max } => {
                artifact.min = min.to_vec();
                artifact.max = max.to_vec();
            }
            ScalerParams::Identity => {}
        }
        artifact
    }
}

fn fitted(parameter: &'static str, values: Vec<f64>) -> Result<ScaledFeatures, ScalerError> {
    let actual = values.len();
    values
        .try_into()
        .map_err(|_| ScalerError::DimensionMismatch {
            parameter,
            expected: FEATURE_DIMENSION,
            actual,
        })
}

impl Scaler for FittedScaler {
    fn transform(&self, features: &FeatureVector) -> Result<ScaledFeatures, ScalerError> {
        let mut values = features.values();

        match &self.params {
            ScalerParams::Standard { mean, scale } => {
                for ((value, mean), scale) in values.iter_mut().zip(mean).zip(scale) {
                    let scale = if scale.abs() < MIN_SCALE { 1.0 } else { *scale };
                    *value = (*value - mean) / scale;
                }
            }
            ScalerParams::MinMax { min, max } => {
                for ((value, min), max) in values.iter_mut().zip(min).zip(max) {
                    let range = max - min;
                    let range = if range.abs() < MIN_SCALE { 1.0 } else { range };
                    *value = (*value - min) / range;
                }
            }
            ScalerParams::Identity => {}
        }

        Ok(values)
    }

    fn name(&self) -> &str {
        self.method().as_str()
    }
}

fn default_feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| name.to_string()).collect()
}
