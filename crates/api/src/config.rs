//! Application Configuration
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! `HOUSE_PRICE__SECTION__KEY` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use data_validator::ValidationConfig;
use inference_engine::ArtifactPaths;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5001".to_string(),
        }
    }
}

/// Locations of the training artifacts and source dataset
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub encoders_path: PathBuf,
    /// Only read by the web server, to enumerate form options
    pub dataset_path: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        let dir = Path::new("artifacts");
        Self {
            model_path: dir.join("house_price_model.json"),
            scaler_path: dir.join("scaler.json"),
            encoders_path: dir.join("encoders.json"),
            dataset_path: dir.join("house_prices_srilanka.csv"),
        }
    }
}

impl ArtifactsConfig {
    /// Paths the inference engine loads
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            scaler: self.scaler_path.clone(),
            encoders: self.encoders_path.clone(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration; a missing file falls back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("HOUSE_PRICE").separator("__"))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
