//! House Price Inference Engine
//!
//! Runs the shared pipeline every front-end goes through: validate, encode,
//! order, scale, predict, format.

mod engine;
mod format;
mod model;

pub use engine::{ArtifactPaths, FeatureImportance, InferenceEngine};
pub use format::{format_price, PricePrediction, CURRENCY};
pub use model::{Link, ModelSummary, RegressionModel};

use data_validator::ValidationError;
use feature_engine::EncodingError;
use serde::Serialize;
use thiserror::Error;

/// Per-request prediction failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("Model produced a non-finite price ({0})")]
    NonFinitePrediction(f64),
}

/// Machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingField,
    TypeMismatch,
    OutOfRange,
    UnknownCategory,
    NonFinitePrediction,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "missing_field",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::UnknownCategory => "unknown_category",
            ErrorKind::NonFinitePrediction => "non_finite_prediction",
        }
    }
}

impl PredictionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::Validation(ValidationError::MissingField(_)) => ErrorKind::MissingField,
            PredictionError::Validation(ValidationError::TypeMismatch { .. }) => ErrorKind::TypeMismatch,
            PredictionError::Validation(ValidationError::OutOfRange { .. }) => ErrorKind::OutOfRange,
            PredictionError::Encoding(EncodingError::UnknownCategory { .. }) => ErrorKind::UnknownCategory,
            PredictionError::NonFinitePrediction(_) => ErrorKind::NonFinitePrediction,
        }
    }

    /// Input field the error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            PredictionError::Validation(e) => Some(e.field()),
            PredictionError::Encoding(EncodingError::UnknownCategory { field, .. }) => Some(field.as_str()),
            PredictionError::NonFinitePrediction(_) => None,
        }
    }

    /// Whether the caller supplied bad input
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PredictionError::NonFinitePrediction(_))
    }
}
