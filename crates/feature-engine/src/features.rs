//! Feature Record and Fixed-Order Vector Assembly

use data_validator::{FieldReader, ValidationError, Validator};
use serde::Serialize;
use serde_json::{Map, Value};

/// Number of features the scaler and model were fitted with
pub const FEATURE_DIMENSION: usize = 13;

/// Column order the scaler and model were fitted with
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "district",
    "area",
    "perch",
    "bedrooms",
    "bathrooms",
    "kitchen_area_sqft",
    "parking_spots",
    "has_garden",
    "has_ac",
    "water_supply",
    "electricity",
    "floors",
    "year_built",
];

/// Raw attributes of one listing to be priced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub district: String,
    /// Not checked against `district`
    pub area: String,
    /// Land size in perches
    pub perch: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub kitchen_area_sqft: u32,
    pub parking_spots: u32,
    pub has_garden: bool,
    pub has_ac: bool,
    pub water_supply: String,
    pub electricity: String,
    pub floors: u32,
    pub year_built: i32,
}

impl FeatureRecord {
    /// Build a record from a loosely typed input object
    ///
    /// Presence of all fields is checked before any conversion, so a missing
    /// field is always reported as missing. Unknown extra keys are ignored.
    pub fn from_fields(
        fields: &Map<String, Value>,
        validator: &Validator,
    ) -> Result<Self, ValidationError> {
        let reader = FieldReader::new(fields);

        for name in FEATURE_NAMES {
            reader.require(name)?;
        }

        let record = Self {
            district: reader.string("district")?,
            area: reader.string("area")?,
            perch: reader.float("perch")?,
            bedrooms: reader.unsigned("bedrooms")?,
            bathrooms: reader.unsigned("bathrooms")?,
            kitchen_area_sqft: reader.unsigned("kitchen_area_sqft")?,
            parking_spots: reader.unsigned("parking_spots")?,
            has_garden: reader.boolean("has_garden")?,
            has_ac: reader.boolean("has_ac")?,
            water_supply: reader.string("water_supply")?,
            electricity: reader.string("electricity")?,
            floors: reader.unsigned("floors")?,
            year_built: reader.integer("year_built")?,
        };

        record.validate(validator)?;
        Ok(record)
    }

    /// Check numeric attributes against the configured ranges
    pub fn validate(&self, validator: &Validator) -> Result<(), ValidationError> {
        if !self.perch.is_finite() {
            return Err(ValidationError::TypeMismatch {
                field: "perch",
                expected: "a finite number",
                found: self.perch.to_string(),
            });
        }
        validator.validate_perch(self.perch)?;
        validator.validate_bedrooms(self.bedrooms)?;
        validator.validate_bathrooms(self.bathrooms)?;
        validator.validate_kitchen_area(self.kitchen_area_sqft)?;
        validator.validate_parking_spots(self.parking_spots)?;
        validator.validate_floors(self.floors)?;
        validator.validate_year_built(self.year_built)?;
        Ok(())
    }
}

/// Encoded feature vector in training column order
///
/// Field order here is the column order. `to_array` is the only place the
/// vector is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub district: f64,
    pub area: f64,
    pub perch: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub kitchen_area_sqft: f64,
    pub parking_spots: f64,
    pub has_garden: f64,
    pub has_ac: f64,
    pub water_supply: f64,
    pub electricity: f64,
    pub floors: f64,
    pub year_built: f64,
}

impl FeatureVector {
    /// Flatten into the fitted column order
    pub fn to_array(&self) -> [f64; FEATURE_DIMENSION] {
        let Self {
            district,
            area,
            perch,
            bedrooms,
            bathrooms,
            kitchen_area_sqft,
            parking_spots,
            has_garden,
            has_ac,
            water_supply,
            electricity,
            floors,
            year_built,
        } = *self;

        [
            district,
            area,
            perch,
            bedrooms,
            bathrooms,
            kitchen_area_sqft,
            parking_spots,
            has_garden,
            has_ac,
            water_supply,
            electricity,
            floors,
            year_built,
        ]
    }

    /// Iterate `(column name, value)` pairs in fitted order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn colombo_fields() -> Map<String, Value> {
        match json!({
            "district": "Colombo",
            "area": "Colombo 7",
            "perch": 10,
            "bedrooms": 3,
            "bathrooms": 2,
            "kitchen_area_sqft": 150,
            "parking_spots": 2,
            "has_garden": true,
            "has_ac": true,
            "water_supply": "Pipe-borne",
            "electricity": "Three phase",
            "floors": 2,
            "year_built": 2020
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_record_from_fields() {
        let record = FeatureRecord::from_fields(&colombo_fields(), &Validator::default()).unwrap();

        assert_eq!(record.district, "Colombo");
        assert_eq!(record.perch, 10.0);
        assert_eq!(record.kitchen_area_sqft, 150);
        assert!(record.has_garden);
        assert_eq!(record.year_built, 2020);
    }

    #[test]
    fn test_missing_year_built() {
        let mut fields = colombo_fields();
        fields.remove("year_built");

        let err = FeatureRecord::from_fields(&fields, &Validator::default()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("year_built"));
    }

    #[test]
    fn test_missing_reported_before_type_mismatch() {
        let mut fields = colombo_fields();
        fields.insert("perch".into(), json!("lots"));
        fields.remove("floors");

        let err = FeatureRecord::from_fields(&fields, &Validator::default()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("floors"));
    }

    #[test]
    fn test_non_numeric_perch() {
        let mut fields = colombo_fields();
        fields.insert("perch".into(), json!("lots"));

        let err = FeatureRecord::from_fields(&fields, &Validator::default()).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { field: "perch", .. }));
    }

    #[test]
    fn test_out_of_range_perch() {
        let mut fields = colombo_fields();
        fields.insert("perch".into(), json!(0));

        let err = FeatureRecord::from_fields(&fields, &Validator::default()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "perch", .. }));
    }

    #[test]
    fn test_vector_order_matches_names() {
        let vector = FeatureVector {
            district: 0.0,
            area: 1.0,
            perch: 2.0,
            bedrooms: 3.0,
            bathrooms: 4.0,
            kitchen_area_sqft: 5.0,
            parking_spots: 6.0,
            has_garden: 7.0,
            has_ac: 8.0,
            water_supply: 9.0,
            electricity: 10.0,
            floors: 11.0,
            year_built: 12.0,
        };

        for (idx, (name, value)) in vector.named().enumerate() {
            assert_eq!(value, idx as f64, "column {name} out of place");
        }
        assert_eq!(FEATURE_NAMES[5], "kitchen_area_sqft");
        assert_eq!(FEATURE_NAMES[12], "year_built");
    }
}
