//! Prediction Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use inference_engine::PredictionError;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

use crate::telemetry;
use crate::AppState;

const INVALID_BODY: &str = "invalid_body";

/// Successful prediction
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: &'static str,
    pub prediction: f64,
    pub formatted_prediction: String,
}

/// Failed prediction
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    pub message: String,
}

impl ErrorBody {
    fn new(kind: &'static str, field: Option<&'static str>, message: String) -> Self {
        Self {
            status: "error",
            kind,
            field,
            message,
        }
    }
}

fn invalid_body(message: String) -> Response {
    warn!(%message, "Rejected malformed prediction body");
    telemetry::record_rejection(INVALID_BODY);
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(INVALID_BODY, None, message))).into_response()
}

fn prediction_error(err: PredictionError) -> Response {
    telemetry::record_error(err.kind());

    let status = if err.is_client_error() {
        warn!(kind = err.kind().as_str(), field = err.field(), "Rejected prediction input: {}", err);
        StatusCode::BAD_REQUEST
    } else {
        error!(kind = err.kind().as_str(), "Prediction failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = ErrorBody::new(err.kind().as_str(), err.field(), err.to_string());
    (status, Json(body)).into_response()
}

/// Predict a price from a JSON object of listing attributes
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let fields = match body {
        Ok(Json(Value::Object(fields))) => fields,
        Ok(Json(_)) => return invalid_body("Request body must be a JSON object".to_string()),
        Err(rejection) => return invalid_body(rejection.body_text()),
    };

    let started = Instant::now();
    match state.engine.predict_fields(&fields) {
        Ok(prediction) => {
            telemetry::record_prediction(started.elapsed());
            Json(PredictResponse {
                status: "success",
                prediction: prediction.price,
                formatted_prediction: prediction.formatted,
            })
            .into_response()
        }
        Err(err) => prediction_error(err),
    }
}
