//! Data Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
///
/// All ranges are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Land size valid range (perches)
    pub perch_range: (f64, f64),
    /// Bedroom count valid range
    pub bedrooms_range: (f64, f64),
    /// Bathroom count valid range
    pub bathrooms_range: (f64, f64),
    /// Kitchen area valid range (sqft)
    pub kitchen_area_range: (f64, f64),
    /// Parking spot count valid range
    pub parking_spots_range: (f64, f64),
    /// Floor count valid range
    pub floors_range: (f64, f64),
    /// Construction year valid range
    pub year_built_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            perch_range: (f64::MIN_POSITIVE, 100_000.0),
            bedrooms_range: (0.0, 100.0),
            bathrooms_range: (0.0, 100.0),
            kitchen_area_range: (1.0, 100_000.0),
            parking_spots_range: (0.0, 1_000.0),
            floors_range: (0.0, 200.0),
            year_built_range: (1800.0, 2100.0),
        }
    }
}

/// Range validator for listing attributes
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if value < range.0 || value > range.1 {
            debug!(field, value, min = range.0, max = range.1, "Value out of range");
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

    /// Validate land size
    pub fn validate_perch(&self, perch: f64) -> Result<(), ValidationError> {
        self.validate_range("perch", perch, self.config.perch_range)
    }

    /// Validate bedroom count
    pub fn validate_bedrooms(&self, bedrooms: u32) -> Result<(), ValidationError> {
        self.validate_range("bedrooms", bedrooms as f64, self.config.bedrooms_range)
    }

    /// Validate bathroom count
    pub fn validate_bathrooms(&self, bathrooms: u32) -> Result<(), ValidationError> {
        self.validate_range("bathrooms", bathrooms as f64, self.config.bathrooms_range)
    }

    /// Validate kitchen area
    pub fn validate_kitchen_area(&self, sqft: u32) -> Result<(), ValidationError> {
        self.validate_range("kitchen_area_sqft", sqft as f64, self.config.kitchen_area_range)
    }

    /// Validate parking spot count
    pub fn validate_parking_spots(&self, spots: u32) -> Result<(), ValidationError> {
        self.validate_range("parking_spots", spots as f64, self.config.parking_spots_range)
    }

    /// Validate floor count
    pub fn validate_floors(&self, floors: u32) -> Result<(), ValidationError> {
        self.validate_range("floors", floors as f64, self.config.floors_range)
    }

    /// Validate construction year
    pub fn validate_year_built(&self, year: i32) -> Result<(), ValidationError> {
        self.validate_range("year_built", year as f64, self.config.year_built_range)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_perch() {
        let validator = Validator::default();
        assert!(validator.validate_perch(10.0).is_ok());
        assert!(validator.validate_perch(0.5).is_ok());
    }

    #[test]
    fn test_zero_perch_rejected() {
        let validator = Validator::default();
        let err = validator.validate_perch(0.0).unwrap_err();
        assert_eq!(err.field(), "perch");
        assert!(validator.validate_perch(-3.0).is_err());
    }

    #[test]
    fn test_year_built_range() {
        let validator = Validator::default();
        assert!(validator.validate_year_built(1800).is_ok());
        assert!(validator.validate_year_built(2020).is_ok());
        assert!(validator.validate_year_built(2100).is_ok());
        assert!(validator.validate_year_built(1200).is_err());
        assert!(validator.validate_year_built(3020).is_err());
    }

    #[test]
    fn test_kitchen_area_must_be_positive() {
        let validator = Validator::default();
        assert!(validator.validate_kitchen_area(0).is_err());
        assert!(validator.validate_kitchen_area(150).is_ok());
    }

    #[test]
    fn test_custom_config() {
        let validator = Validator::new(ValidationConfig {
            bedrooms_range: (1.0, 10.0),
            ..Default::default()
        });
        assert!(validator.validate_bedrooms(0).is_err());
        assert!(validator.validate_bedrooms(3).is_ok());
        assert!(validator.validate_bedrooms(11).is_err());
    }
}
