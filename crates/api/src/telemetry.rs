//! Logging and Metrics Setup

use crate::config::{LogFormat, LoggingConfig};
use anyhow::{Context, Result};
use inference_engine::ErrorKind;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize logging
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so the
/// terminal prompt keeps stdout to itself.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if let Err(e) = result {
        eprintln!("Tracing subscriber already set: {e}");
    }
}

/// Install the global Prometheus recorder
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Record a successful prediction
pub fn record_prediction(elapsed: Duration) {
    counter!("predictions_total", "outcome" => "success").increment(1);
    histogram!("prediction_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record a rejected prediction request
pub fn record_rejection(kind: &'static str) {
    counter!("predictions_total", "outcome" => "error").increment(1);
    counter!("prediction_errors_total", "kind" => kind).increment(1);
}

/// Record a pipeline error
pub fn record_error(kind: ErrorKind) {
    record_rejection(kind.as_str());
}
