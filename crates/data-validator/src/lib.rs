//! Property Input Validation
//!
//! Range checking for the raw form inputs and the derived bedroom discrepancy.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{InputField, ValidationConfig, Validator};
