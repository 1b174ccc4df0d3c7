//! Axum HTTP surface: the HTML form plus a small JSON API.

pub mod models;
pub mod page;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::form::FormController;

/// Shared application state, passed to all route handlers via Axum `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub controller: FormController,
}

/// Builds the router around an already constructed controller.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ckd_predictor::{FormController, ModelManager, SharedModel};
///
/// let model = SharedModel::lazy(ModelManager::new_default());
/// let app = ckd_predictor::server::build_app(FormController::new(Arc::new(model)));
/// ```
pub fn build_app(controller: FormController) -> Router {
    let state = Arc::new(AppState { controller });

    Router::new()
        .route("/", get(routes::index).post(routes::submit_form))
        .route("/api/predict", post(routes::predict))
        .route("/health", get(routes::health))
        .with_state(state)
}
