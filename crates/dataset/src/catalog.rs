//! Categorical Domains from the Source Dataset

use crate::DatasetError;
use feature_engine::{CategoricalField, EncoderSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns of a listing row the catalog cares about
#[derive(Debug, Deserialize)]
struct ListingRow {
    district: String,
    area: String,
    water_supply: String,
    electricity: String,
}

/// Form options, as served by `GET /options`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOptions {
    pub districts: Vec<String>,
    pub areas_by_district: BTreeMap<String, Vec<String>>,
    pub water_supply: Vec<String>,
    pub electricity: Vec<String>,
    pub has_garden: [bool; 2],
    pub has_ac: [bool; 2],
}

/// Distinct categorical values seen in the source dataset
#[derive(Debug, Clone, Default)]
pub struct ListingCatalog {
    areas_by_district: BTreeMap<String, BTreeSet<String>>,
    water_supply: BTreeSet<String>,
    electricity: BTreeSet<String>,
    rows: usize,
}

impl ListingCatalog {
    /// Read the dataset CSV
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|e| DatasetError::Csv {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let catalog = Self::from_reader(file).map_err(|source| DatasetError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        if catalog.areas_by_district.is_empty() {
            return Err(DatasetError::Empty {
                path: path.to_path_buf(),
            });
        }

        info!(
            path = %path.display(),
            rows = catalog.rows,
            districts = catalog.areas_by_district.len(),
            "Dataset catalog loaded"
        );
        Ok(catalog)
    }

    /// Read listing rows from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut catalog = Self::default();
        let mut csv = csv::Reader::from_reader(reader);

        for row in csv.deserialize::<ListingRow>() {
            let row = row?;
            catalog.rows += 1;

            if row.district.is_empty() || row.area.is_empty() {
                debug!(row = catalog.rows, "Skipping row without district or area");
                continue;
            }
            catalog
                .areas_by_district
                .entry(row.district)
                .or_default()
                .insert(row.area);
            if !row.water_supply.is_empty() {
                catalog.water_supply.insert(row.water_supply);
            }
            if !row.electricity.is_empty() {
                catalog.electricity.insert(row.electricity);
            }
        }

        Ok(catalog)
    }

    /// Drop every label the encoders were not fitted on
    ///
    /// Offering such a label would only lead to an unknown-category error.
    pub fn restrict_to(mut self, encoders: &EncoderSet) -> Self {
        let known = |field: CategoricalField, label: &str| encoders.get(field).contains(label);
        let mut dropped = 0usize;

        self.areas_by_district.retain(|district, areas| {
            if !known(CategoricalField::District, district) {
                warn!(%district, "Dataset district unknown to encoder, hiding it");
                dropped += 1;
                return false;
            }
            areas.retain(|area| {
                let keep = known(CategoricalField::Area, area);
                if !keep {
                    warn!(%district, %area, "Dataset area unknown to encoder, hiding it");
                    dropped += 1;
                }
                keep
            });
            !areas.is_empty()
        });

        for (field, labels) in [
            (CategoricalField::WaterSupply, &mut self.water_supply),
            (CategoricalField::Electricity, &mut self.electricity),
        ] {
            labels.retain(|label| {
                let keep = known(field, label);
                if !keep {
                    warn!(column = %field, %label, "Dataset label unknown to encoder, hiding it");
                    dropped += 1;
                }
                keep
            });
        }

        if dropped > 0 {
            warn!(dropped, "Dataset and encoders disagree on categorical labels");
        }
        self
    }

    /// Sorted distinct values for input forms
    pub fn options(&self) -> CategoryOptions {
        CategoryOptions {
            districts: self.areas_by_district.keys().cloned().collect(),
            areas_by_district: self
                .areas_by_district
                .iter()
                .map(|(district, areas)| (district.clone(), areas.iter().cloned().collect()))
                .collect(),
            water_supply: self.water_supply.iter().cloned().collect(),
            electricity: self.electricity.iter().cloned().collect(),
            has_garden: [false, true],
            has_ac: [false, true],
        }
    }

}
