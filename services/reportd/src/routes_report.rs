use axum::extract::State;
use axum::Json;
use llm::ChatMessage;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::prompts;
use crate::state::{bad_request, internal_error, ApiError, SharedState};
use crate::weather::WeatherSummary;

/// Near-zero sampling temperature, to minimize contradiction across sections
/// of the same report.
const TEMPERATURE: f32 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 3000;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSectionRequest {
    pub section: Option<String>,
    #[serde(default)]
    pub context: Value,
    pub custom_instructions: Option<String>,
}

pub async fn generate_section(
    State(state): State<SharedState>,
    Json(req): Json<GenerateSectionRequest>,
) -> Result<Json<Value>, ApiError> {
    let section = req
        .section
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| bad_request("Invalid request", "section is required"))?;

    let weather = lookup_weather(&state, &req.context).await;

    let prompt = prompts::build_section_prompt(
        &section,
        &req.context,
        weather.as_ref(),
        req.custom_instructions.as_deref(),
    );
    let messages = [ChatMessage::system(prompts::SYSTEM_PROMPT), ChatMessage::user(prompt)];

    let model = finetune::resolve_model(&*state.settings).await;
    let text = state
        .inference
        .complete(&model, &messages, TEMPERATURE, MAX_OUTPUT_TOKENS)
        .await
        .map_err(|e| internal_error("Failed to generate report section", e))?;

    Ok(Json(serde_json::json!({
        "section": text,
        "sectionName": section,
        "weatherData": weather,
    })))
}

/// Weather is best-effort: a context without coordinates or a provider
/// failure degrades to no weather data rather than failing generation.
async fn lookup_weather(state: &SharedState, context: &Value) -> Option<WeatherSummary> {
    let latitude = context.get("latitude").and_then(Value::as_f64)?;
    let longitude = context.get("longitude").and_then(Value::as_f64)?;
    let date = context.get("dateOfLoss").and_then(Value::as_str)?;

    match state.weather.historical(latitude, longitude, date).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            warn!(error = %e, date, "weather lookup failed, continuing without it");
            None
        }
    }
}
