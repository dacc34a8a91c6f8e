use llm::{InferenceClient, JobState};
use stores::SettingsStore;
use tracing::{info, warn};

use crate::{Result, KEY_ACTIVE_MODEL, KEY_CURRENT_JOB, KEY_IN_PROGRESS};

#[derive(Clone, Debug)]
pub enum PollOutcome {
    /// No job handle recorded; polling is a no-op.
    Idle,
    /// Job succeeded and the resulting model is now the active model.
    Promoted { model: String },
    /// Job reported success without a resulting model identifier. The job
    /// state is cleared but the previously active model stays in place.
    SucceededWithoutModel,
    /// Job failed; cleared without promoting anything.
    Failed,
    /// Job still queued/running (or in a provider-specific interim state);
    /// nothing was mutated.
    InProgress { status: String },
}

/// Check the in-flight tuning job and promote its model if it finished.
/// This is the only writer of the active-model key. A settings read failure
/// or a status-query failure is a hard error with no state mutated; the
/// caller retries the poll later.
pub async fn poll(
    settings: &dyn SettingsStore,
    inference: &dyn InferenceClient,
) -> Result<PollOutcome> {
    let job_id = match settings.get(KEY_CURRENT_JOB).await? {
        Some(id) => id,
        None => return Ok(PollOutcome::Idle),
    };

    let status = inference.job_status(&job_id).await?;

    match status.state {
        JobState::Succeeded => {
            let model = status.fine_tuned_model.filter(|m| !m.trim().is_empty());
            match model {
                Some(model) => {
                    settings.upsert(KEY_ACTIVE_MODEL, &model).await?;
                    settings.delete(KEY_CURRENT_JOB).await?;
                    settings.upsert(KEY_IN_PROGRESS, "false").await?;
                    info!(job_id = %job_id, model = %model, "fine-tuned model promoted");
                    Ok(PollOutcome::Promoted { model })
                }
                None => {
                    // Fail safe: clear the job, keep the prior active model.
                    warn!(job_id = %job_id, "job succeeded without a resulting model id");
                    settings.delete(KEY_CURRENT_JOB).await?;
                    settings.upsert(KEY_IN_PROGRESS, "false").await?;
                    Ok(PollOutcome::SucceededWithoutModel)
                }
            }
        }
        JobState::Failed => {
            warn!(job_id = %job_id, "fine-tune job failed");
            settings.delete(KEY_CURRENT_JOB).await?;
            settings.upsert(KEY_IN_PROGRESS, "false").await?;
            Ok(PollOutcome::Failed)
        }
        state => Ok(PollOutcome::InProgress {
            status: state.as_str().to_string(),
        }),
    }
}
