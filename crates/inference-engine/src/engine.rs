//! Inference Engine Implementation

use crate::format::PricePrediction;
use crate::model::RegressionModel;
use crate::PredictionError;
use data_validator::{ValidationConfig, Validator};
use feature_engine::{ArtifactError, EncoderSet, FeatureRecord, Scaler, FEATURE_NAMES};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locations of the persisted training artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub encoders: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside one directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join("house_price_model.json"),
            scaler: dir.join("scaler.json"),
            encoders: dir.join("encoders.json"),
        }
    }
}

/// One bar of the feature-importance chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: f64,
}

/// Shared, read-only prediction pipeline
///
/// Holds the frozen encoders, scaler and model for the life of the process.
pub struct InferenceEngine {
    encoders: EncoderSet,
    scaler: Scaler,
    model: RegressionModel,
    validator: Validator,
}

impl InferenceEngine {
    /// Assemble an engine from already-loaded artifacts
    pub fn new(encoders: EncoderSet, scaler: Scaler, model: RegressionModel, validator: Validator) -> Self {
        Self {
            encoders,
            scaler,
            model,
            validator,
        }
    }

    /// Load every artifact; any failure is fatal to the caller
    pub fn load(paths: &ArtifactPaths, validation: ValidationConfig) -> Result<Self, ArtifactError> {
        info!(
            model = %paths.model.display(),
            scaler = %paths.scaler.display(),
            encoders = %paths.encoders.display(),
            "Loading inference artifacts"
        );

        let model = RegressionModel::load(&paths.model)?;
        let scaler = Scaler::load(&paths.scaler)?;
        let encoders = EncoderSet::load(&paths.encoders)?;

        Ok(Self::new(encoders, scaler, model, Validator::new(validation)))
    }

    /// Predict from a loosely typed input object
    ///
    /// This is the entry point for front-ends: the shape check happens here.
    pub fn predict_fields(&self, fields: &Map<String, Value>) -> Result<PricePrediction, PredictionError> {
        let record = FeatureRecord::from_fields(fields, &self.validator)?;
        self.run(&record)
    }

    /// Predict from a typed record
    pub fn predict(&self, record: &FeatureRecord) -> Result<PricePrediction, PredictionError> {
        record.validate(&self.validator)?;
        self.run(record)
    }

    fn run(&self, record: &FeatureRecord) -> Result<PricePrediction, PredictionError> {
        let vector = self.encoders.encode(record)?;
        let scaled = self.scaler.transform(&vector);
        let price = self.model.predict(&scaled) as f64;

        if !price.is_finite() {
            return Err(PredictionError::NonFinitePrediction(price));
        }

        debug!(district = %record.district, area = %record.area, price, "Prediction completed");
        Ok(PricePrediction::new(price))
    }

    /// Model-reported importances, largest first
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        let mut bars: Vec<FeatureImportance> = FEATURE_NAMES
            .iter()
            .zip(self.model.feature_importances())
            .map(|(&feature, &importance)| FeatureImportance { feature, importance })
            .collect();

        // Stable sort keeps column order among ties
        bars.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        bars
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn model(&self) -> &RegressionModel {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use feature_engine::{CategoricalField, EncodingError};
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::OnceLock;

    fn fixtures() -> ArtifactPaths {
        ArtifactPaths::in_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures"))
    }

    fn engine() -> &'static InferenceEngine {
        static ENGINE: OnceLock<InferenceEngine> = OnceLock::new();
        ENGINE.get_or_init(|| InferenceEngine::load(&fixtures(), ValidationConfig::default()).unwrap())
    }

    fn colombo() -> Map<String, Value> {
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
    fn test_colombo_listing() {
        let prediction = engine().predict_fields(&colombo()).unwrap();

        assert_eq!(prediction.price, 28_500_000.0);
        assert_eq!(prediction.formatted, "LKR 28,500,000.00");
    }

    #[test]
    fn test_typed_and_raw_paths_agree() {
        let engine = engine();
        let record = FeatureRecord::from_fields(&colombo(), &Validator::default()).unwrap();

        let typed = engine.predict(&record).unwrap();
        let raw = engine.predict_fields(&colombo()).unwrap();
        assert_eq!(typed.price.to_bits(), raw.price.to_bits());
    }

    #[test]
    fn test_unknown_district() {
        let mut fields = colombo();
        fields.insert("district".into(), json!("Atlantis"));

        let err = engine().predict_fields(&fields).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCategory);
        assert_eq!(err.field(), Some("district"));
        assert_eq!(
            err,
            PredictionError::Encoding(EncodingError::UnknownCategory {
                field: CategoricalField::District,
                label: "Atlantis".into(),
            })
        );
    }

    #[test]
    fn test_missing_year_built() {
        let mut fields = colombo();
        fields.remove("year_built");

        let err = engine().predict_fields(&fields).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(err.field(), Some("year_built"));
    }

    #[test]
    fn test_non_numeric_perch() {
        let mut fields = colombo();
        fields.insert("perch".into(), json!("big"));

        let err = engine().predict_fields(&fields).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_typed_record_is_range_checked() {
        let mut record = FeatureRecord::from_fields(&colombo(), &Validator::default()).unwrap();
        record.perch = -2.0;

        let err = engine().predict(&record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_area_not_checked_against_district() {
        let mut fields = colombo();
        fields.insert("area".into(), json!("Kandy City"));

        assert!(engine().predict_fields(&fields).is_ok());
    }

    #[test]
    fn test_field_order_does_not_change_price() {
        let engine = engine();
        let forward = engine.predict_fields(&colombo()).unwrap();

        // Rebuild the object from its entries in reverse, names kept with values
        let entries: Vec<(String, Value)> = colombo().into_iter().collect();
        let reversed: Map<String, Value> = entries.into_iter().rev().collect();
        let backward = engine.predict_fields(&reversed).unwrap();
        assert_eq!(forward.price.to_bits(), backward.price.to_bits());

        let record = FeatureRecord::from_fields(&reversed, &Validator::default()).unwrap();
        let typed = engine.predict(&record).unwrap();
        assert_eq!(forward.price.to_bits(), typed.price.to_bits());

        // Moving values between columns must move the price
        let mut swapped = colombo();
        swapped.insert("perch".into(), json!(3));
        swapped.insert("bedrooms".into(), json!(10));
        let moved = engine.predict_fields(&swapped).unwrap();
        assert_eq!(moved.price, 25_500_000.0);
        assert_ne!(forward.price.to_bits(), moved.price.to_bits());
    }

    fn overflowing_engine() -> InferenceEngine {
        let model = RegressionModel::from_json(
            &json!({
                "learner": {
                    "gradient_booster": {
                        "name": "gbtree",
                        "model": {
                            "gbtree_model_param": { "num_parallel_tree": "1" },
                            "trees": [{
                                "left_children": [-1],
                                "right_children": [-1],
                                "split_indices": [0],
                                "split_conditions": [200.0],
                                "default_left": [0],
                                "split_type": [0],
                                "loss_changes": [0.0]
                            }]
                        }
                    },
                    "learner_model_param": { "base_score": "1E0", "num_feature": "13" },
                    "objective": { "name": "reg:gamma" }
                }
            })
            .to_string(),
        )
        .unwrap();

        let paths = fixtures();
        InferenceEngine::new(
            EncoderSet::load(&paths.encoders).unwrap(),
            Scaler::load(&paths.scaler).unwrap(),
            model,
            Validator::default(),
        )
    }

    #[test]
    fn test_overflowing_price_is_an_error() {
        let err = overflowing_engine().predict_fields(&colombo()).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NonFinitePrediction);
        assert_eq!(err.field(), None);
        assert!(!err.is_client_error());
        assert!(matches!(err, PredictionError::NonFinitePrediction(p) if p.is_infinite()));
    }

    #[test]
    fn test_feature_importances_sorted() {
        let bars = engine().feature_importances();

        assert_eq!(bars.len(), FEATURE_NAMES.len());
        assert_eq!(bars[0].feature, "perch");
        assert!(bars.windows(2).all(|w| w[0].importance >= w[1].importance));

        let total: f64 = bars.iter().map(|b| b.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let mut paths = fixtures();
        paths.scaler = PathBuf::from("/nonexistent/scaler.json");

        let result = InferenceEngine::load(&paths, ValidationConfig::default());
        assert!(matches!(result, Err(ArtifactError::Io { artifact: "scaler", .. })));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InferenceEngine>();
    }

    fn record_strategy() -> impl Strategy<Value = FeatureRecord> {
        let labels = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        (
            (
                prop::sample::select(labels(&["Colombo", "Gampaha", "Kandy"])),
                prop::sample::select(labels(&["Colombo 7", "Kandy City", "Negombo", "Nugegoda", "Wattala"])),
                0.1f64..500.0,
                0u32..20,
                0u32..20,
                1u32..2000,
            ),
            (
                0u32..10,
                any::<bool>(),
                any::<bool>(),
                prop::sample::select(labels(&["Pipe-borne", "Tube well", "Well"])),
                prop::sample::select(labels(&["Single phase", "Three phase"])),
                0u32..10,
                1900i32..2026,
            ),
        )
            .prop_map(
                |(
                    (district, area, perch, bedrooms, bathrooms, kitchen_area_sqft),
                    (parking_spots, has_garden, has_ac, water_supply, electricity, floors, year_built),
                )| FeatureRecord {
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
                },
            )
    }

    proptest! {
        #[test]
        fn prop_valid_records_price_is_finite_and_deterministic(record in record_strategy()) {
            let engine = engine();
            let first = engine.predict(&record).unwrap();
            let second = engine.predict(&record).unwrap();

            prop_assert!(first.price.is_finite());
            prop_assert!(first.price >= 0.0);
            prop_assert_eq!(first.price.to_bits(), second.price.to_bits());
            prop_assert!(first.formatted.starts_with("LKR "));
        }

        #[test]
        fn prop_numeric_strings_match_numbers(bedrooms in 0u32..20, floors in 0u32..10) {
            let engine = engine();
            let mut numbers = colombo();
            numbers.insert("bedrooms".into(), json!(bedrooms));
            numbers.insert("floors".into(), json!(floors));

            let mut strings = colombo();
            strings.insert("bedrooms".into(), json!(bedrooms.to_string()));
            strings.insert("floors".into(), json!(floors.to_string()));

            let a = engine.predict_fields(&numbers).unwrap();
            let b = engine.predict_fields(&strings).unwrap();
            prop_assert_eq!(a.price.to_bits(), b.price.to_bits());
        }
    }
}
