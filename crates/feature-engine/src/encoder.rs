//! Frozen Label Encoders for Categorical Columns

use crate::artifact::{read_json, ArtifactError};
use crate::features::{FeatureRecord, FeatureVector};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const ARTIFACT: &str = "encoders";

/// Categorical column with a fitted encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    District,
    Area,
    WaterSupply,
    Electricity,
}

impl CategoricalField {
    /// All encoded columns
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::District,
        CategoricalField::Area,
        CategoricalField::WaterSupply,
        CategoricalField::Electricity,
    ];

    /// Column name
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoricalField::District => "district",
            CategoricalField::Area => "area",
            CategoricalField::WaterSupply => "water_supply",
            CategoricalField::Electricity => "electricity",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors during categorical encoding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("Unknown {field} {label:?}: not among the labels the encoder was fitted on")]
    UnknownCategory {
        field: CategoricalField,
        label: String,
    },
}

/// Frozen label → code mapping for one column
///
/// A label's code is its position in the fitted class list.
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    field: CategoricalField,
    classes: Vec<String>,
    codes: HashMap<String, u32>,
}

impl CategoryEncoder {
    /// Build an encoder from its fitted class list
    pub fn from_classes(field: CategoricalField, classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!("encoder for {field} has no classes"),
            ));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (code, label) in classes.iter().enumerate() {
            let code = u32::try_from(code).map_err(|_| {
                ArtifactError::invalid(ARTIFACT, format!("encoder for {field} has too many classes"))
            })?;
            if codes.insert(label.clone(), code).is_some() {
                return Err(ArtifactError::invalid(
                    ARTIFACT,
                    format!("encoder for {field} lists {label:?} more than once"),
                ));
            }
        }

        Ok(Self {
            field,
            classes,
            codes,
        })
    }

    /// Look up the code for a label
    pub fn encode(&self, label: &str) -> Result<u32, EncodingError> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| EncodingError::UnknownCategory {
                field: self.field,
                label: label.to_string(),
            })
    }

    /// Whether the label was seen at fit time
    pub fn contains(&self, label: &str) -> bool {
        self.codes.contains_key(label)
    }

    /// Fitted labels in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// The four fitted encoders
#[derive(Debug, Clone)]
pub struct EncoderSet {
    district: CategoryEncoder,
    area: CategoryEncoder,
    water_supply: CategoryEncoder,
    electricity: CategoryEncoder,
}

impl EncoderSet {
    /// Load `{column: [classes...]}` from a JSON artifact
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let classes: BTreeMap<String, Vec<String>> = read_json(ARTIFACT, path)?;
        let encoders = Self::from_classes(classes)?;

        info!(
            path = %path.display(),
            districts = encoders.district.classes().len(),
            areas = encoders.area.classes().len(),
            "Encoders loaded"
        );
        Ok(encoders)
    }

    /// Build the set from per-column class lists
    pub fn from_classes(mut classes: BTreeMap<String, Vec<String>>) -> Result<Self, ArtifactError> {
        let mut take = |field: CategoricalField| {
            let list = classes.remove(field.as_str()).ok_or_else(|| {
                ArtifactError::invalid(ARTIFACT, format!("no encoder for column {field}"))
            })?;
            CategoryEncoder::from_classes(field, list)
        };

        let set = Self {
            district: take(CategoricalField::District)?,
            area: take(CategoricalField::Area)?,
            water_supply: take(CategoricalField::WaterSupply)?,
            electricity: take(CategoricalField::Electricity)?,
        };

        for extra in classes.keys() {
            warn!(column = %extra, "Ignoring encoder for a column the model does not use");
        }

        Ok(set)
    }

    /// Encoder for one column
    pub fn get(&self, field: CategoricalField) -> &CategoryEncoder {
        match field {
            CategoricalField::District => &self.district,
            CategoricalField::Area => &self.area,
            CategoricalField::WaterSupply => &self.water_supply,
            CategoricalField::Electricity => &self.electricity,
        }
    }

    /// Encode a record into the fitted column order
    pub fn encode(&self, record: &FeatureRecord) -> Result<FeatureVector, EncodingError> {
        Ok(FeatureVector {
            district: self.district.encode(&record.district)? as f64,
            area: self.area.encode(&record.area)? as f64,
            perch: record.perch,
            bedrooms: record.bedrooms as f64,
            bathrooms: record.bathrooms as f64,
            kitchen_area_sqft: record.kitchen_area_sqft as f64,
            parking_spots: record.parking_spots as f64,
            has_garden: flag(record.has_garden),
            has_ac: flag(record.has_ac),
            water_supply: self.water_supply.encode(&record.water_supply)? as f64,
            electricity: self.electricity.encode(&record.electricity)? as f64,
            floors: record.floors as f64,
            year_built: record.year_built as f64,
        })
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
