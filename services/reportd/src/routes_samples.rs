use axum::extract::State;
use axum::Json;
use finetune::{CollectOutcome, FinetuneError, SampleSubmission};
use serde::Deserialize;
use serde_json::Value;

use crate::state::{bad_request, internal_error, ApiError, SharedState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSampleRequest {
    pub final_report_text: Option<String>,
    pub ratings: Option<serde_json::Map<String, Value>>,
    pub metadata: Option<serde_json::Map<String, Value>>,
}

pub async fn store_sample(
    State(state): State<SharedState>,
    Json(req): Json<StoreSampleRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = finetune::collect_sample(
        state.settings.clone(),
        state.samples.clone(),
        state.inference.clone(),
        SampleSubmission {
            final_report_text: req.final_report_text,
            ratings: req.ratings,
            metadata: req.metadata,
        },
    )
    .await
    .map_err(|e| match e {
        FinetuneError::Validation(details) => bad_request("Invalid request", details),
        other => internal_error("Failed to store training sample", other),
    })?;

    let body = match outcome {
        CollectOutcome::NotStored => serde_json::json!({
            "message": "Sample not stored: one or more ratings are below the quality threshold",
        }),
        CollectOutcome::Stored {
            count,
            fine_tune_triggered,
        } => serde_json::json!({
            "message": "Training sample stored",
            "sampleCount": count,
            "fineTuneTriggered": fine_tune_triggered,
        }),
    };
    Ok(Json(body))
}
