//! Data Validation
//!
//! Provides shape checking, type coercion, and range validation for raw
//! listing attributes before they reach the feature encoders.

mod error;
mod fields;
mod validator;

pub use error::ValidationError;
pub use fields::FieldReader;
pub use validator::{ValidationConfig, Validator};
