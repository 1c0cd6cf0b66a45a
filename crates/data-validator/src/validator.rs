//! Range Checking for Property Inputs

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// User-supplied input fields, in feature vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    Rooms,
    Distance,
    Bedrooms,
    Bathrooms,
    CarSpaces,
}

impl InputField {
    /// All input fields in feature vector order
    pub const ALL: [InputField; 5] = [
        InputField::Rooms,
        InputField::Distance,
        InputField::Bedrooms,
        InputField::Bathrooms,
        InputField::CarSpaces,
    ];

    /// Field name used in error messages and API bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            InputField::Rooms => "rooms",
            InputField::Distance => "distance",
            InputField::Bedrooms => "bedrooms",
            InputField::Bathrooms => "bathrooms",
            InputField::CarSpaces => "car_spaces",
        }
    }

    /// Human-readable form label
    pub fn label(&self) -> &'static str {
        match self {
            InputField::Rooms => "Number of Rooms",
            InputField::Distance => "Distance from CBD (km)",
            InputField::Bedrooms => "Number of Bedrooms",
            InputField::Bathrooms => "Number of Bathrooms",
            InputField::CarSpaces => "Number of Car Spaces",
        }
    }

    /// Whether the field only takes whole numbers
    pub fn is_integer(&self) -> bool {
        !matches!(self, InputField::Distance)
    }
}

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Total rooms
    pub rooms_range: (f64, f64),
    /// Distance to the CBD (km)
    pub distance_range: (f64, f64),
    /// Bedroom count
    pub bedrooms_range: (f64, f64),
    /// Bathroom count
    pub bathrooms_range: (f64, f64),
    /// Car spaces
    pub car_spaces_range: (f64, f64),
    /// Rooms minus bedrooms
    pub discrepancy_range: (i32, i32),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            rooms_range: (1.0, 8.0),
            distance_range: (0.0, 50.0),
            bedrooms_range: (0.0, 8.0),
            bathrooms_range: (0.0, 5.0),
            car_spaces_range: (0.0, 5.0),
            discrepancy_range: (-8, 8),
        }
    }
}

impl ValidationConfig {
    /// Allowed range for an input field
    pub fn range(&self, field: InputField) -> (f64, f64) {
        match field {
            InputField::Rooms => self.rooms_range,
            InputField::Distance => self.distance_range,
            InputField::Bedrooms => self.bedrooms_range,
            InputField::Bathrooms => self.bathrooms_range,
            InputField::CarSpaces => self.car_spaces_range,
        }
    }
}

/// Validator for property inputs
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value.is_nan() || value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate one input field against its configured range
    pub fn validate_field(&self, field: InputField, value: f64) -> Result<(), ValidationError> {
        self.validate_range(field.as_str(), value, self.config.range(field))
    }

    /// Clamp a value into the configured range for its field.
    ///
    /// Integer fields are rounded first. NaN clamps to the lower bound.
    pub fn clamp_field(&self, field: InputField, value: f64) -> f64 {
        let (min, max) = self.config.range(field);
        if value.is_nan() {
            return min;
        }
        let value = if field.is_integer() { value.round() } else { value };
        let clamped = value.clamp(min, max);
        if clamped != value {
            debug!("Clamped {} from {} to {}", field.as_str(), value, clamped);
        }
        clamped
    }

    /// Validate the derived bedroom discrepancy.
    ///
    /// With the default input ranges the bound can never be exceeded, since
    /// rooms - bedrooms spans exactly [-7, 8]. The check still runs for
    /// configurations that widen the input ranges.
    pub fn validate_discrepancy(&self, discrepancy: i64) -> Result<(), ValidationError> {
        let (min, max) = self.config.discrepancy_range;
        if discrepancy < i64::from(min) || discrepancy > i64::from(max) {
            Err(ValidationError::OutOfRangeDiscrepancy {
                value: discrepancy,
                min,
                max,
            })
        } else {
            Ok(())
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
