//! HTTP Routes

pub mod form;
pub mod model;
pub mod predictions;

use feature_engine::PropertyFeatures;
use inference_engine::{EstimateError, PriceEstimate, Severity};
use std::time::Instant;
use tracing::error;

use crate::AppState;

/// Run the estimate pipeline and record the outcome
pub(crate) fn run_estimate(
    state: &AppState,
    input: &PropertyFeatures,
) -> Result<PriceEstimate, EstimateError> {
    let start = Instant::now();
    let result = state.predictor.estimate(input);
    metrics::histogram!("estimator_inference_seconds").record(start.elapsed().as_secs_f64());

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => match e.severity() {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => {
                error!("Estimate failed: {}", e);
                "failure"
            }
        },
    };
    metrics::counter!("estimator_predictions_total", "outcome" => outcome).increment(1);

    result
}
