use std::sync::Arc;

use bytes::Bytes;
use llm::{render_training_file, ChatMessage, InferenceClient, TrainingExample};
use stores::{SampleStore, SettingsStore};
use tracing::{info, warn};

use crate::{Result, FINETUNE_BASE_MODEL, KEY_CURRENT_JOB, KEY_IN_PROGRESS};

const SYSTEM_INSTRUCTION: &str =
    "You are a forensic engineer writing professional engineering report sections.";
const USER_INSTRUCTION: &str =
    "Write a complete forensic engineering report in the firm's standard style.";
const UPLOAD_PURPOSE: &str = "fine-tune";

#[derive(Clone, Debug)]
pub enum LaunchOutcome {
    /// No samples have accumulated yet; nothing to do.
    NoSamples,
    Started { job_id: String },
}

/// Package every stored sample into a training file, submit a tuning job,
/// and record the job handle as in progress.
///
/// Not idempotency-guarded: two concurrent launches can submit overlapping
/// jobs and the later handle write orphans the earlier job. Accepted
/// limitation of the best-effort batch trigger.
pub async fn launch(
    settings: Arc<dyn SettingsStore>,
    samples: Arc<dyn SampleStore>,
    inference: Arc<dyn InferenceClient>,
    trigger: &str,
) -> Result<LaunchOutcome> {
    // Oldest first, so the training file is reproducible across launches.
    let all = samples.list_all_ordered().await?;
    if all.is_empty() {
        info!(trigger, "fine-tune launch requested with no samples");
        return Ok(LaunchOutcome::NoSamples);
    }

    let examples: Vec<TrainingExample> = all
        .iter()
        .map(|s| TrainingExample {
            messages: vec![
                ChatMessage::system(SYSTEM_INSTRUCTION),
                ChatMessage::user(USER_INSTRUCTION),
                ChatMessage::assistant(s.text.clone()),
            ],
        })
        .collect();

    // The serialized payload is owned by this invocation and dropped on
    // every exit path below.
    let payload = Bytes::from(render_training_file(&examples)?);
    info!(trigger, examples = examples.len(), bytes = payload.len(), "submitting training file");

    let dataset_id = inference.upload_dataset(payload, UPLOAD_PURPOSE).await?;
    let job_id = inference
        .create_tuning_job(FINETUNE_BASE_MODEL, &dataset_id)
        .await?;

    if let Err(e) = settings.upsert(KEY_CURRENT_JOB, &job_id).await {
        // Partial state: the job exists remotely but is untracked here.
        // Recovery is reconciliation against the provider's job list.
        warn!(job_id = %job_id, error = %e, "tuning job created but handle persistence failed");
        return Err(e.into());
    }
    settings.upsert(KEY_IN_PROGRESS, "true").await?;

    info!(job_id = %job_id, dataset_id = %dataset_id, "fine-tune job started");
    Ok(LaunchOutcome::Started { job_id })
}
