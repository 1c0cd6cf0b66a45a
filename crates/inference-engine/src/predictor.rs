//! Price Estimation Pipeline
//!
//! prepare → scale → predict → sign check. The scaler and model are injected
//! as shared read-only handles, so one predictor serves every request.

use crate::engine::Regressor;
use crate::InferenceError;
use data_validator::ValidationError;
use feature_engine::{FeaturePreparer, FeatureVector, PropertyFeatures, Scaler, ScalerError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// How an estimate failure is surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Inputs need adjusting; nothing was predicted
    Warning,
    /// A prediction was made but cannot be shown
    Error,
    /// Scaler or model failure
    Fatal,
}

/// Reasons an estimate is not produced
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Model predicted a negative price ({value})")]
    NegativePrediction { value: f64 },
    #[error("Scaling failed: {0}")]
    Scaling(#[from] ScalerError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl EstimateError {
    pub fn severity(&self) -> Severity {
        match self {
            EstimateError::Validation(_) => Severity::Warning,
            EstimateError::NegativePrediction { .. } => Severity::Error,
            EstimateError::Scaling(_) | EstimateError::Inference(_) => Severity::Fatal,
        }
    }

    /// Message shown on the form
    pub fn user_message(&self) -> String {
        match self {
            EstimateError::Validation(ValidationError::OutOfRangeDiscrepancy { min, max, .. }) => {
                format!(
                    "Bedroom Discrepancy is unrealistic (should be between {} and {}). Adjust Rooms or Bedrooms.",
                    min, max
                )
            }
            EstimateError::Validation(err) => err.to_string(),
            EstimateError::NegativePrediction { .. } => {
                "Prediction is negative, which is invalid. Please check input values.".to_string()
            }
            EstimateError::Scaling(_) | EstimateError::Inference(_) => {
                "The price model failed to produce an estimate.".to_string()
            }
        }
    }
}

/// Successful price estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEstimate {
    /// Estimated price in dollars, never negative
    pub price: f64,
    /// Feature vector the estimate was made from
    pub features: FeatureVector,
}

/// Runs one submission through the full pipeline
#[derive(Clone)]
pub struct PricePredictor {
    preparer: FeaturePreparer,
    scaler: Arc<dyn Scaler>,
    model: Arc<dyn Regressor>,
}

impl PricePredictor {
    pub fn new(
        preparer: FeaturePreparer,
        scaler: Arc<dyn Scaler>,
        model: Arc<dyn Regressor>,
    ) -> Self {
        Self {
            preparer,
            scaler,
            model,
        }
    }

    /// Preparer holding the active validation ranges
    pub fn preparer(&self) -> &FeaturePreparer {
        &self.preparer
    }

    /// Backend name of the injected model
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Method name of the injected scaler
    pub fn scaler_name(&self) -> &str {
        self.scaler.name()
    }

    /// Estimate the price for one set of inputs
    pub fn estimate(&self, input: &PropertyFeatures) -> Result<PriceEstimate, EstimateError> {
        let features = self.preparer.prepare(input).map_err(|e| {
            warn!("Rejected inputs: {}", e);
            e
        })?;

        let scaled = self.scaler.transform(&features)?;
        let value = self.model.predict(&scaled)?;
        debug!("Scaled features {:?} -> {}", scaled, value);

        if !value.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "Model produced non-finite output {}",
                value
            ))
            .into());
        }
        if value < 0.0 {
            warn!("Negative prediction {} for {:?}", value, features);
            return Err(EstimateError::NegativePrediction { value });
        }

        Ok(PriceEstimate {
            price: value,
            features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::{ValidationConfig, Validator};
    use feature_engine::{FittedScaler, ScaledFeatures};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed value and records what it was called with
    struct FixedModel {
        value: f64,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(value: f64) -> Arc<Self> {
            Arc::new(Self {
                value,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Regressor for FixedModel {
        fn predict(&self, _features: &[f64]) -> Result<f64, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.value)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Echoes the scaled vector's sum so scaling is observable
    struct SumModel;

    impl Regressor for SumModel {
        fn predict(&self, features: &[f64]) -> Result<f64, InferenceError> {
            Ok(features.iter().sum())
        }

        fn name(&self) -> &str {
            "sum"
        }
    }

    struct BrokenScaler;

    impl Scaler for BrokenScaler {
        fn transform(&self, _features: &FeatureVector) -> Result<ScaledFeatures, ScalerError> {
            Err(ScalerError::DimensionMismatch {
                parameter: "mean",
                expected: 6,
                actual: 0,
            })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn predictor(model: Arc<dyn Regressor>) -> PricePredictor {
        PricePredictor::new(
            FeaturePreparer::default(),
            Arc::new(FittedScaler::identity()),
            model,
        )
    }

    #[test]
    fn test_successful_estimate() {
        let predictor = predictor(FixedModel::new(1_250_000.0));
        let estimate = predictor.estimate(&PropertyFeatures::default()).unwrap();
        assert_eq!(estimate.price, 1_250_000.0);
        assert_eq!(estimate.features.discrepancy(), 0);
        assert_eq!(predictor.model_name(), "fixed");
        assert_eq!(predictor.scaler_name(), "identity");
    }

    #[test]
    fn test_negative_prediction_suppressed() {
        let predictor = predictor(FixedModel::new(-5_000.0));
        let err = predictor.estimate(&PropertyFeatures::default()).unwrap_err();
        assert!(matches!(err, EstimateError::NegativePrediction { value } if value == -5_000.0));
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(
            err.user_message(),
            "Prediction is negative, which is invalid. Please check input values."
        );
    }

    #[test]
    fn test_nan_prediction_is_fatal() {
        let predictor = predictor(FixedModel::new(f64::NAN));
        let err = predictor.estimate(&PropertyFeatures::default()).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::Inference(InferenceError::InferenceFailed(_))
        ));
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_infinite_prediction_is_fatal() {
        let predictor = predictor(FixedModel::new(f64::INFINITY));
        let err = predictor.estimate(&PropertyFeatures::default()).unwrap_err();
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_zero_prediction_is_valid() {
        let predictor = predictor(FixedModel::new(0.0));
        assert!(predictor.estimate(&PropertyFeatures::default()).is_ok());
    }

    #[test]
    fn test_validation_failure_skips_model() {
        let model = FixedModel::new(1.0);
        let predictor = PricePredictor::new(
            FeaturePreparer::new(Validator::new(ValidationConfig {
                discrepancy_range: (-1, 1),
                ..Default::default()
            })),
            Arc::new(FittedScaler::identity()),
            model.clone(),
        );
        let input = PropertyFeatures {
            rooms: 6,
            bedrooms: 2,
            ..Default::default()
        };
        let err = predictor.estimate(&input).unwrap_err();
        assert_eq!(err.severity(), Severity::Warning);
        assert_eq!(
            err.user_message(),
            "Bedroom Discrepancy is unrealistic (should be between -1 and 1). Adjust Rooms or Bedrooms."
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scaler_applied_before_model() {
        let predictor = PricePredictor::new(
            FeaturePreparer::default(),
            Arc::new(FittedScaler::standard(
                [3.0, 10.0, 3.0, 1.0, 1.0, 0.0],
                [1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            )),
            Arc::new(SumModel),
        );
        let input = PropertyFeatures {
            rooms: 4,
            distance: 12.0,
            bedrooms: 3,
            bathrooms: 1,
            car_spaces: 1,
        };
        let estimate = predictor.estimate(&input).unwrap();
        // (4-3) + (12-10) + 0 + 0 + 0 + (1-0)
        assert_eq!(estimate.price, 4.0);
    }

    #[test]
    fn test_scaler_failure_is_fatal() {
        let predictor = PricePredictor::new(
            FeaturePreparer::default(),
            Arc::new(BrokenScaler),
            FixedModel::new(1.0),
        );
        let err = predictor.estimate(&PropertyFeatures::default()).unwrap_err();
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_identical_inputs_identical_outcome() {
        let predictor = predictor(Arc::new(SumModel));
        let input = PropertyFeatures {
            rooms: 5,
            distance: 7.3,
            bedrooms: 4,
            bathrooms: 2,
            car_spaces: 2,
        };
        let first = predictor.estimate(&input).unwrap();
        let second = predictor.estimate(&input).unwrap();
        assert_eq!(first, second);
    }
}
