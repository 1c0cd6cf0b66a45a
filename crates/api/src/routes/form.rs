//! Estimate Form
//!
//! Server-rendered single page: five inputs, the derived bedroom discrepancy,
//! a predict button and the model details. The page lives in
//! `templates/form.html` and is rendered with HTML autoescaping.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use data_validator::{InputField, Validator};
use feature_engine::PropertyFeatures;
use inference_engine::{format_currency, Severity};
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use tracing::error;

use super::run_estimate;
use crate::{AppState, SharedState};

/// Name of the page template; the `.html` suffix turns on autoescaping
const FORM_TEMPLATE: &str = "form.html";

/// Build the template environment held in [`AppState`]
pub fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(FORM_TEMPLATE, include_str!("../../templates/form.html"))?;
    Ok(env)
}

/// Raw form fields.
///
/// Kept as text so an empty or malformed value falls back to the default
/// instead of failing the whole submission; numbers are then clamped like
/// the browser's number inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormInput {
    pub rooms: Option<String>,
    pub distance: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub car_spaces: Option<String>,
}

impl FormInput {
    fn raw(&self, field: InputField) -> Option<&str> {
        match field {
            InputField::Rooms => self.rooms.as_deref(),
            InputField::Distance => self.distance.as_deref(),
            InputField::Bedrooms => self.bedrooms.as_deref(),
            InputField::Bathrooms => self.bathrooms.as_deref(),
            InputField::CarSpaces => self.car_spaces.as_deref(),
        }
    }

    fn value(&self, field: InputField) -> f64 {
        self.raw(field)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or_else(|| PropertyFeatures::default().get(field))
    }

    fn to_features(&self, validator: &Validator) -> PropertyFeatures {
        PropertyFeatures {
            rooms: self.value(InputField::Rooms).round() as i32,
            distance: self.value(InputField::Distance),
            bedrooms: self.value(InputField::Bedrooms).round() as i32,
            bathrooms: self.value(InputField::Bathrooms).round() as i32,
            car_spaces: self.value(InputField::CarSpaces).round() as i32,
        }
        .clamped(validator)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Notice {
    Warning { message: String },
    Error { message: String },
    Success { price: String, disclaimer: String },
}

/// One number input, with bounds already formatted for the page
#[derive(Debug, Serialize)]
struct FieldSpec {
    name: &'static str,
    label: &'static str,
    min: String,
    max: String,
    step: &'static str,
    value: String,
}

/// Render the empty form with default values
pub async fn show_form(State(state): State<SharedState>) -> Response {
    page_response(StatusCode::OK, &state, &PropertyFeatures::default(), None)
}

/// Handle a "Predict Price" submission
pub async fn submit_form(
    State(state): State<SharedState>,
    Form(input): Form<FormInput>,
) -> Response {
    let features = input.to_features(state.predictor.preparer().validator());

    let (status, notice) = match run_estimate(&state, &features) {
        Ok(estimate) => (
            StatusCode::OK,
            Notice::Success {
                price: format_currency(estimate.price),
                disclaimer: state.card.disclaimer(),
            },
        ),
        Err(e) => {
            let message = e.user_message();
            match e.severity() {
                Severity::Warning => (StatusCode::OK, Notice::Warning { message }),
                Severity::Error => (StatusCode::OK, Notice::Error { message }),
                Severity::Fatal => (StatusCode::INTERNAL_SERVER_ERROR, Notice::Error { message }),
            }
        }
    };

    page_response(status, &state, &features, Some(notice))
}

fn page_response(
    status: StatusCode,
    state: &AppState,
    input: &PropertyFeatures,
    notice: Option<Notice>,
) -> Response {
    match render_page(state, input, notice) {
        Ok(page) => (status, Html(page)).into_response(),
        Err(e) => {
            error!("Failed to render {}: {}", FORM_TEMPLATE, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

fn field_specs(validator: &Validator, input: &PropertyFeatures) -> Vec<FieldSpec> {
    InputField::ALL
        .iter()
        .map(|&field| {
            let (min, max) = validator.config().range(field);
            FieldSpec {
                name: field.as_str(),
                label: field.label(),
                min: min.to_string(),
                max: max.to_string(),
                step: if field.is_integer() { "1" } else { "0.1" },
                value: input.get(field).to_string(),
            }
        })
        .collect()
}

fn render_page(
    state: &AppState,
    input: &PropertyFeatures,
    notice: Option<Notice>,
) -> Result<String, minijinja::Error> {
    let card = &state.card;
    state.templates.get_template(FORM_TEMPLATE)?.render(context! {
        fields => field_specs(state.predictor.preparer().validator(), input),
        discrepancy => input.discrepancy(),
        notice => notice,
        card => card,
        r_squared => format!("{:.4}", card.r_squared),
        explained_variance => format!("{:.1}", card.explained_variance_pct()),
        mae => format_currency(card.mae),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(pairs: [&str; 5]) -> FormInput {
        let [rooms, distance, bedrooms, bathrooms, car_spaces] = pairs.map(|v| Some(v.to_string()));
        FormInput {
            rooms,
            distance,
            bedrooms,
            bathrooms,
            car_spaces,
        }
    }

    #[test]
    fn test_form_input_clamped_and_rounded() {
        let features = input(["9", "62.5", "2.6", "-1", "1"]).to_features(&Validator::default());
        assert_eq!(
            features,
            PropertyFeatures {
                rooms: 8,
                distance: 50.0,
                bedrooms: 3,
                bathrooms: 0,
                car_spaces: 1,
            }
        );
    }

    #[test]
    fn test_form_defaults_match_features() {
        let features = FormInput::default().to_features(&Validator::default());
        assert_eq!(features, PropertyFeatures::default());
    }

    #[test]
    fn test_blank_or_malformed_fields_use_defaults() {
        let features = input(["", "far", " 4 ", "2", "abc"]).to_features(&Validator::default());
        assert_eq!(
            features,
            PropertyFeatures {
                rooms: 3,
                distance: 10.0,
                bedrooms: 4,
                bathrooms: 2,
                car_spaces: 1,
            }
        );
    }

    #[test]
    fn test_field_specs_format_bounds() {
        let specs = field_specs(&Validator::default(), &PropertyFeatures::default());
        assert_eq!(specs.len(), 5);
        assert_eq!(specs[0].name, "rooms");
        assert_eq!((specs[0].min.as_str(), specs[0].max.as_str()), ("1", "8"));
        assert_eq!(specs[1].step, "0.1");
        assert_eq!(specs[1].value, "10");
    }

    #[test]
    fn test_template_compiles() {
        let env = templates().unwrap();
        assert!(env.get_template(FORM_TEMPLATE).is_ok());
    }
}
