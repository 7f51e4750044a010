//! Feature Importance Routes

use axum::{extract::State, Json};
use inference_engine::FeatureImportance;
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for importance endpoint
#[derive(Debug, Serialize)]
pub struct ImportanceResponse {
    pub features: Vec<FeatureImportance>,
}

/// Get model feature importances, largest first
pub async fn get_importance(State(state): State<Arc<AppState>>) -> Json<ImportanceResponse> {
    Json(ImportanceResponse {
        features: state.engine.feature_importances(),
    })
}
