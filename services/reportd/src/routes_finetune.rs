use axum::extract::State;
use axum::Json;
use finetune::{LaunchOutcome, PollOutcome};
use serde::Deserialize;
use serde_json::Value;

use crate::state::{internal_error, ApiError, SharedState};

#[derive(Deserialize, Default)]
pub struct LaunchRequest {
    pub trigger: Option<String>,
}

pub async fn launch_finetune(
    State(state): State<SharedState>,
    body: Option<Json<LaunchRequest>>,
) -> Result<Json<Value>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let trigger = req.trigger.unwrap_or_else(|| "manual".to_string());

    let outcome = finetune::launch(
        state.settings.clone(),
        state.samples.clone(),
        state.inference.clone(),
        &trigger,
    )
    .await
    .map_err(|e| internal_error("Failed to launch fine-tuning", e))?;

    let body = match outcome {
        LaunchOutcome::NoSamples => serde_json::json!({
            "message": "No training samples available; nothing to fine-tune",
        }),
        LaunchOutcome::Started { job_id } => serde_json::json!({
            "message": "Fine-tuning job started",
            "fineTuneId": job_id,
        }),
    };
    Ok(Json(body))
}

pub async fn poll_status(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let outcome = finetune::poll(&*state.settings, &*state.inference)
        .await
        .map_err(|e| internal_error("Failed to poll fine-tune status", e))?;

    let body = match outcome {
        PollOutcome::Idle => serde_json::json!({
            "message": "No fine-tune job in progress",
        }),
        PollOutcome::Promoted { model } => serde_json::json!({
            "message": format!("Fine-tuned model promoted: {model}"),
            "status": "succeeded",
        }),
        PollOutcome::SucceededWithoutModel => serde_json::json!({
            "message": "Job succeeded without a model id; previous active model kept",
            "status": "succeeded",
        }),
        PollOutcome::Failed => serde_json::json!({
            "message": "Fine-tune job failed; job state cleared",
            "status": "failed",
        }),
        PollOutcome::InProgress { status } => serde_json::json!({
            "message": "Fine-tune job still in progress",
            "status": status,
        }),
    };
    Ok(Json(body))
}
