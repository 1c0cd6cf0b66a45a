//! Prediction Routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use feature_engine::PropertyFeatures;
use inference_engine::{format_currency, Severity};
use serde::{Deserialize, Serialize};

use super::run_estimate;
use crate::SharedState;

/// Outcome shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Warning,
    Error,
}

/// Response for predictions endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub outcome: Outcome,
    pub message: String,
    /// Rooms minus bedrooms for the submitted inputs
    pub discrepancy: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

/// Error body for rejected requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn error_response(status: StatusCode, error: &str, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message,
        }),
    )
        .into_response()
}

/// Estimate a price from JSON inputs.
///
/// Unlike the form, out-of-range inputs are rejected rather than clamped.
pub async fn create_prediction(
    State(state): State<SharedState>,
    Json(input): Json<PropertyFeatures>,
) -> Response {
    if let Err(e) = input.validate_inputs(state.predictor.preparer().validator()) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", e.to_string());
    }

    let discrepancy = input.discrepancy();
    match run_estimate(&state, &input) {
        Ok(estimate) => {
            let formatted = format_currency(estimate.price);
            Json(PredictionResponse {
                outcome: Outcome::Success,
                message: format!("Estimated House Price: {}", formatted),
                discrepancy,
                price: Some(estimate.price),
                formatted_price: Some(formatted),
                disclaimer: Some(state.card.disclaimer()),
            })
            .into_response()
        }
        Err(e) => {
            let outcome = match e.severity() {
                Severity::Warning => Outcome::Warning,
                Severity::Error => Outcome::Error,
                Severity::Fatal => {
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "inference_failed",
                        e.user_message(),
                    )
                }
            };
            Json(PredictionResponse {
                outcome,
                message: e.user_message(),
                discrepancy,
                price: None,
                formatted_price: None,
                disclaimer: None,
            })
            .into_response()
        }
    }
}
