//! Request and response types for the JSON API.

use serde::Serialize;

use crate::classifier::Diagnosis;
use crate::form::{Outcome, DISCLAIMER};
use crate::validator::FieldError;

/// Response body for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether the classifier has been loaded successfully
    pub model_loaded: bool,
}

/// One field-level problem.
#[derive(Debug, Serialize)]
pub struct FieldErrorResponse {
    pub field: String,
    pub kind: String,
    pub message: String,
}

impl From<&FieldError> for FieldErrorResponse {
    fn from(error: &FieldError) -> Self {
        Self {
            field: error.field().to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Response body for `POST /api/predict`.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// `ok`, `invalid`, `model_unavailable` or `prediction_failed`
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<&'static str>,
}

impl From<&Outcome> for PredictResponse {
    fn from(outcome: &Outcome) -> Self {
        let empty = Self {
            status: "",
            diagnosis: None,
            message: None,
            errors: Vec::new(),
            disclaimer: None,
        };
        match outcome {
            Outcome::Predicted(diagnosis) => Self {
                status: "ok",
                diagnosis: Some(*diagnosis),
                message: Some(diagnosis.message().to_string()),
                disclaimer: Some(DISCLAIMER),
                ..empty
            },
            Outcome::Invalid(errors) => Self {
                status: "invalid",
                errors: errors.iter().map(FieldErrorResponse::from).collect(),
                ..empty
            },
            Outcome::ModelUnavailable(message) => Self {
                status: "model_unavailable",
                message: Some(message.clone()),
                ..empty
            },
            Outcome::PredictionFailed(message) => Self {
                status: "prediction_failed",
                message: Some(message.clone()),
                ..empty
            },
        }
    }
}
