//! Validation Error Types

use thiserror::Error;

/// Errors during input validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Derived bedroom discrepancy outside the realistic range
    #[error("Bedroom discrepancy {value} is out of range [{min}, {max}]")]
    OutOfRangeDiscrepancy { value: i64, min: i32, max: i32 },

    /// Raw input value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    /// Whether this error comes from the derived discrepancy check
    pub fn is_discrepancy(&self) -> bool {
        matches!(self, ValidationError::OutOfRangeDiscrepancy { .. })
    }
}
