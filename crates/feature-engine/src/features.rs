//! Feature Vector Assembly

use data_validator::{InputField, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = 6;

/// Column names the model and scaler were fitted on, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "Rooms",
    "Distance",
    "Bedroom2",
    "Bathroom",
    "Car",
    "Bedroom_Discrepancy",
];

/// Raw property details from one submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyFeatures {
    /// Total rooms
    pub rooms: i32,
    /// Distance from the CBD (km)
    pub distance: f64,
    /// Bedroom count
    pub bedrooms: i32,
    /// Bathroom count
    pub bathrooms: i32,
    /// Car spaces
    pub car_spaces: i32,
}

impl Default for PropertyFeatures {
    fn default() -> Self {
        Self {
            rooms: 3,
            distance: 10.0,
            bedrooms: 3,
            bathrooms: 1,
            car_spaces: 1,
        }
    }
}

impl PropertyFeatures {
    /// Bedroom discrepancy (rooms minus bedrooms), always derived from the
    /// current field values
    pub fn discrepancy(&self) -> i64 {
        i64::from(self.rooms) - i64::from(self.bedrooms)
    }

    /// Value of one input field
    pub fn get(&self, field: InputField) -> f64 {
        match field {
            InputField::Rooms => self.rooms as f64,
            InputField::Distance => self.distance,
            InputField::Bedrooms => self.bedrooms as f64,
            InputField::Bathrooms => self.bathrooms as f64,
            InputField::CarSpaces => self.car_spaces as f64,
        }
    }

    /// Copy with every input clamped into its configured range
    pub fn clamped(&self, validator: &Validator) -> Self {
        let clamp = |field| validator.clamp_field(field, self.get(field));
        Self {
            rooms: clamp(InputField::Rooms) as i32,
            distance: clamp(InputField::Distance),
            bedrooms: clamp(InputField::Bedrooms) as i32,
            bathrooms: clamp(InputField::Bathrooms) as i32,
            car_spaces: clamp(InputField::CarSpaces) as i32,
        }
    }

    /// Check every raw input against its configured range
    pub fn validate_inputs(&self, validator: &Validator) -> Result<(), ValidationError> {
        InputField::ALL
            .iter()
            .try_for_each(|&field| validator.validate_field(field, self.get(field)))
    }
}

/// Ordered feature vector handed to the scaler.
///
/// Fields are private so the discrepancy can only come from [`FeaturePreparer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    rooms: i32,
    distance: f64,
    bedrooms: i32,
    bathrooms: i32,
    car_spaces: i32,
    discrepancy: i64,
}

impl FeatureVector {
    /// Values in model order:
    /// `[rooms, distance, bedrooms, bathrooms, car_spaces, discrepancy]`
    pub fn values(&self) -> [f64; FEATURE_DIMENSION] {
        [
            self.rooms as f64,
            self.distance,
            self.bedrooms as f64,
            self.bathrooms as f64,
            self.car_spaces as f64,
            self.discrepancy as f64,
        ]
    }

    /// Bedroom discrepancy that passed validation
    pub fn discrepancy(&self) -> i64 {
        self.discrepancy
    }
}

/// Derives the discrepancy, validates it and assembles the feature vector
#[derive(Debug, Clone, Default)]
pub struct FeaturePreparer {
    validator: Validator,
}

impl FeaturePreparer {
    /// Create a preparer around a validator
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    /// Validator used for the discrepancy check
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Prepare the feature vector for one submission.
    ///
    /// Inputs are expected to be within range already; only the derived
    /// discrepancy is checked here.
    pub fn prepare(&self, input: &PropertyFeatures) -> Result<FeatureVector, ValidationError> {
        let discrepancy = input.discrepancy();
        self.validator.validate_discrepancy(discrepancy)?;

        debug!(
            "Prepared features: rooms={}, distance={}, bedrooms={}, bathrooms={}, car={}, discrepancy={}",
            input.rooms, input.distance, input.bedrooms, input.bathrooms, input.car_spaces, discrepancy
        );

        Ok(FeatureVector {
            rooms: input.rooms,
            distance: input.distance,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            car_spaces: input.car_spaces,
            discrepancy,
        })
    }
}

/// Prepare a feature vector with the default validation ranges
pub fn prepare(
    rooms: i32,
    distance: f64,
    bedrooms: i32,
    bathrooms: i32,
    car_spaces: i32,
) -> Result<FeatureVector, ValidationError> {
    FeaturePreparer::default().prepare(&PropertyFeatures {
        rooms,
        distance,
        bedrooms,
        bathrooms,
        car_spaces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_validator::ValidationConfig;
    use proptest::prelude::*;

    #[test]
    fn test_equal_rooms_and_bedrooms() {
        let features = prepare(3, 10.0, 3, 1, 1).unwrap();
        assert_eq!(features.discrepancy(), 0);
    }

    #[test]
    fn test_more_bedrooms_than_rooms() {
        let features = prepare(1, 10.0, 8, 1, 1).unwrap();
        assert_eq!(features.discrepancy(), -7);
    }

    #[test]
    fn test_upper_bound_inclusive() {
        let features = prepare(8, 10.0, 0, 1, 1).unwrap();
        assert_eq!(features.discrepancy(), 8);
    }

    #[test]
    fn test_vector_order() {
        let features = prepare(4, 12.5, 3, 2, 1).unwrap();
        assert_eq!(features.values(), [4.0, 12.5, 3.0, 2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_rejects_discrepancy_from_widened_ranges() {
        let preparer = FeaturePreparer::new(Validator::new(ValidationConfig {
            rooms_range: (1.0, 20.0),
            ..Default::default()
        }));
        let input = PropertyFeatures {
            rooms: 12,
            bedrooms: 2,
            ..Default::default()
        };
        let err = preparer.prepare(&input).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRangeDiscrepancy {
                value: 10,
                min: -8,
                max: 8,
            }
        );
    }

    #[test]
    fn test_extreme_inputs_rejected_without_overflow() {
        let err = prepare(i32::MIN, 0.0, 1, 0, 0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRangeDiscrepancy {
                value: i64::from(i32::MIN) - 1,
                min: -8,
                max: 8,
            }
        );
        assert!(prepare(i32::MAX, 0.0, i32::MIN, 0, 0).is_err());
    }

    #[test]
    fn test_clamped_inputs() {
        let input = PropertyFeatures {
            rooms: 11,
            distance: -3.0,
            bedrooms: -1,
            bathrooms: 9,
            car_spaces: 2,
        };
        let clamped = input.clamped(&Validator::default());
        assert_eq!(
            clamped,
            PropertyFeatures {
                rooms: 8,
                distance: 0.0,
                bedrooms: 0,
                bathrooms: 5,
                car_spaces: 2,
            }
        );
        assert!(clamped.validate_inputs(&Validator::default()).is_ok());
        assert!(input.validate_inputs(&Validator::default()).is_err());
    }

    #[test]
    fn test_default_form_values() {
        let input = PropertyFeatures::default();
        assert!(input.validate_inputs(&Validator::default()).is_ok());
        assert_eq!(input.discrepancy(), 0);
    }

    proptest! {
        #[test]
        fn discrepancy_accepted_iff_within_bounds(rooms in 1i32..=8, bedrooms in 0i32..=8) {
            let result = prepare(rooms, 10.0, bedrooms, 1, 1);
            let discrepancy = i64::from(rooms - bedrooms);
            prop_assert_eq!(result.is_ok(), (-8..=8).contains(&discrepancy));
            if let Ok(features) = result {
                prop_assert_eq!(features.discrepancy(), discrepancy);
            }
        }

        #[test]
        fn vector_order_is_fixed(
            rooms in 1i32..=8,
            distance in 0.0f64..=50.0,
            bedrooms in 0i32..=8,
            bathrooms in 0i32..=5,
            car_spaces in 0i32..=5,
        ) {
            let features = prepare(rooms, distance, bedrooms, bathrooms, car_spaces).unwrap();
            prop_assert_eq!(
                features.values(),
                [
                    rooms as f64,
                    distance,
                    bedrooms as f64,
                    bathrooms as f64,
                    car_spaces as f64,
                    (rooms - bedrooms) as f64,
                ]
            );
        }

        #[test]
        fn prepare_is_deterministic(rooms in 1i32..=8, bedrooms in 0i32..=8, distance in 0.0f64..=50.0) {
            prop_assert_eq!(
                prepare(rooms, distance, bedrooms, 2, 2),
                prepare(rooms, distance, bedrooms, 2, 2)
            );
        }
    }
}
