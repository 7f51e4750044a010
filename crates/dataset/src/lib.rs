//! Listing Dataset Catalog
//!
//! Reads the source listing dataset once and exposes the distinct categorical
//! values used to populate input forms.

mod catalog;

pub use catalog::{CategoryOptions, ListingCatalog};

use std::path::PathBuf;
use thiserror::Error;

/// Dataset errors
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset at {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Dataset at {} has no usable rows", .path.display())]
    Empty { path: PathBuf },
}
