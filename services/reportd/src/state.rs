use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use llm::InferenceClient;
use stores::{SampleStore, SettingsStore};

use crate::weather::WeatherProvider;

pub type SharedState = Arc<AppState>;

/// Injected collaborators. Every handler invocation is stateless; the only
/// shared mutable state lives behind the settings store.
pub struct AppState {
    pub settings: Arc<dyn SettingsStore>,
    pub samples: Arc<dyn SampleStore>,
    pub inference: Arc<dyn InferenceClient>,
    pub weather: Arc<dyn WeatherProvider>,
}

pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn bad_request(error: &str, details: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": error, "details": details.to_string() })),
    )
}

pub fn internal_error(error: &str, details: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": error, "details": details.to_string() })),
    )
}
