//! House Price API Server
//!
//! HTTP and terminal front-ends over the shared inference engine.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dataset::{CategoryOptions, ListingCatalog};
use inference_engine::{InferenceEngine, ModelSummary};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub mod config;
mod routes;
pub mod telemetry;
pub mod terminal;

use crate::config::AppConfig;

/// Application state shared across handlers
///
/// Built once at startup and never mutated, so handlers share it without locking.
pub struct AppState {
    /// Frozen inference pipeline
    pub engine: InferenceEngine,
    /// Form options, restricted to labels the encoders know
    pub options: CategoryOptions,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(engine: InferenceEngine, catalog: ListingCatalog, metrics: Option<PrometheusHandle>) -> Self {
        let options = catalog.restrict_to(engine.encoders()).options();
        Self {
            engine,
            options,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics,
        }
    }

    /// Load every artifact named in the configuration
    pub fn load(config: &AppConfig, metrics: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        let engine = InferenceEngine::load(&config.artifacts.paths(), config.validation.clone())?;
        let catalog = ListingCatalog::load(&config.artifacts.dataset_path)?;
        Ok(Self::new(engine, catalog, metrics))
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ModelSummary,
    pub districts: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/options", get(routes::options::get_options))
        .route("/predict", post(routes::predict::predict))
        .route("/importance", get(routes::importance::get_importance))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.engine.model().summary().clone(),
        districts: state.options.districts.len(),
    })
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Run the server until Ctrl-C
pub async fn run_server(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
