//! Feature Engineering Engine
//!
//! Turns a validated listing into the fixed-order, scaled feature vector the
//! price model was trained on.

mod artifact;
mod encoder;
mod features;
mod scaler;

pub use artifact::{read_json, ArtifactError};
pub use encoder::{CategoricalField, CategoryEncoder, EncoderSet, EncodingError};
pub use features::{FeatureRecord, FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES};
pub use scaler::{ScaledVector, Scaler};
