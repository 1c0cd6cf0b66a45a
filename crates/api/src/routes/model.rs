//! Model Details Route

use axum::{extract::State, Json};
use feature_engine::FEATURE_NAMES;
use inference_engine::ModelCard;
use serde::Serialize;

use crate::SharedState;

/// Static model metadata plus the loaded backend and scaler
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    #[serde(flatten)]
    pub card: ModelCard,
    pub backend: String,
    pub scaler: String,
    pub feature_names: Vec<&'static str>,
}

/// Get model details
pub async fn get_model(State(state): State<SharedState>) -> Json<ModelResponse> {
    Json(ModelResponse {
        card: state.card.clone(),
        backend: state.predictor.model_name().to_string(),
        scaler: state.predictor.scaler_name().to_string(),
        feature_names: FEATURE_NAMES.to_vec(),
    })
}
