//! Form Option Routes

use axum::{extract::State, Json};
use dataset::CategoryOptions;
use std::sync::Arc;

use crate::AppState;

/// Get the categorical choices for the input form
pub async fn get_options(State(state): State<Arc<AppState>>) -> Json<CategoryOptions> {
    Json(state.options.clone())
}
