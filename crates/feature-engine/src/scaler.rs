//! Frozen Affine Feature Scaling

use crate::artifact::{read_json, ArtifactError};
use crate::features::{FeatureVector, FEATURE_DIMENSION, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const ARTIFACT: &str = "scaler";

/// On-disk scaler parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerArtifact {
    /// Column order the scaler was fitted with, if recorded
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    center: Vec<f64>,
    scale: Vec<f64>,
}

/// Scaled feature vector, ready for the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledVector([f64; FEATURE_DIMENSION]);

impl ScaledVector {
    /// Scaled values in fitted column order
    pub fn values(&self) -> &[f64; FEATURE_DIMENSION] {
        &self.0
    }

    /// Wrap already-scaled values
    pub fn from_values(values: [f64; FEATURE_DIMENSION]) -> Self {
        Self(values)
    }
}

/// Per-feature `(x - center) / scale` transform
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    center: [f64; FEATURE_DIMENSION],
    scale: [f64; FEATURE_DIMENSION],
}

impl Scaler {
    /// Load scaler parameters from a JSON artifact
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: ScalerArtifact = read_json(ARTIFACT, path)?;
        let scaler = Self::from_parts(
            &artifact.center,
            &artifact.scale,
            artifact.feature_names.as_deref(),
        )?;

        info!(path = %path.display(), "Scaler loaded");
        Ok(scaler)
    }

    /// Build a scaler from fitted parameters
    ///
    /// When `feature_names` is given it must match the fitted column order
    /// exactly. A zero scale leaves the centered value unscaled.
    pub fn from_parts(
        center: &[f64],
        scale: &[f64],
        feature_names: Option<&[String]>,
    ) -> Result<Self, ArtifactError> {
        if let Some(names) = feature_names {
            if !names.iter().map(String::as_str).eq(FEATURE_NAMES) {
                return Err(ArtifactError::invalid(
                    ARTIFACT,
                    format!("fitted column order {names:?} does not match {FEATURE_NAMES:?}"),
                ));
            }
        }

        let center = fixed(center, "center")?;
        let mut scale = fixed(scale, "scale")?;

        for (idx, s) in scale.iter_mut().enumerate() {
            if *s == 0.0 {
                debug!(feature = FEATURE_NAMES[idx], "Zero scale, using 1.0");
                *s = 1.0;
            }
        }

        Ok(Self { center, scale })
    }

    /// Scaler that leaves values unchanged
    #[cfg(test)]
    fn identity() -> Self {
        Self {
            center: [0.0; FEATURE_DIMENSION],
            scale: [1.0; FEATURE_DIMENSION],
        }
    }

    /// Apply the transform to an ordered feature vector
    pub fn transform(&self, vector: &FeatureVector) -> ScaledVector {
        let mut values = vector.to_array();
        for ((v, c), s) in values.iter_mut().zip(&self.center).zip(&self.scale) {
            *v = (*v - c) / s;
        }
        ScaledVector::from_values(values)
    }
}

fn fixed(values: &[f64], what: &str) -> Result<[f64; FEATURE_DIMENSION], ArtifactError> {
    let array: [f64; FEATURE_DIMENSION] = values.try_into().map_err(|_| {
        ArtifactError::invalid(
            ARTIFACT,
            format!("{what} has {} entries, expected {FEATURE_DIMENSION}", values.len()),
        )
    })?;

    if let Some(idx) = array.iter().position(|v| !v.is_finite()) {
        return Err(ArtifactError::invalid(
            ARTIFACT,
            format!("{what} for {} is not finite", FEATURE_NAMES[idx]),
        ));
    }
    Ok(array)
}
