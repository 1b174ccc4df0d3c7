//! Axum route handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::{Form, Json};
use serde_json::Value;

use super::models::{HealthResponse, PredictResponse};
use super::page;
use super::AppState;
use crate::form::{FormController, Outcome, RawInput, PREDICTION_FAILED};

/// Runs the submission off the async executor; the ONNX session call blocks.
async fn run_submission(controller: FormController, raw: RawInput) -> Outcome {
    tokio::task::spawn_blocking(move || controller.submit(&raw))
        .await
        .unwrap_or_else(|e| {
            log::error!("Submission task failed: {}", e);
            Outcome::PredictionFailed(PREDICTION_FAILED.to_string())
        })
}

fn model_error(state: &AppState) -> Option<String> {
    state.controller.model().unavailable_reason()
}

/// `GET /` renders the empty form.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render(&RawInput::new(), None, model_error(&state).as_deref()))
}

/// `POST /` validates the url-encoded form and re-renders it with the outcome.
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(values): Form<HashMap<String, String>>,
) -> Html<String> {
    let raw = RawInput::from(values);
    let outcome = run_submission(state.controller.clone(), raw.clone()).await;
    Html(page::render(&raw, Some(&outcome), model_error(&state).as_deref()))
}

/// `POST /api/predict` takes a JSON object of field name to raw value.
///
/// Strings are validated as typed; numbers and booleans are validated by
/// their JSON text, `null` counts as blank.
///
/// # Status codes
///
/// - 200 OK: prediction made
/// - 422 Unprocessable Entity: one or more fields invalid
/// - 503 Service Unavailable: model not loaded
/// - 500 Internal Server Error: classifier failed
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(values): Json<HashMap<String, Value>>,
) -> impl IntoResponse {
    let raw: RawInput = values
        .into_iter()
        .map(|(field, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (field, text)
        })
        .collect();
    let outcome = run_submission(state.controller.clone(), raw).await;
    let status = match &outcome {
        Outcome::Predicted(_) => StatusCode::OK,
        Outcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Outcome::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        Outcome::PredictionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(PredictResponse::from(&outcome)))
}

/// `GET /health` reports service status and whether the model is loaded.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.controller.model().is_loaded(),
    })
}
