//! Fine-tuning lifecycle coordinator.
//!
//! A small state machine spread across stateless request handlers: the
//! collector banks highly rated reports as training samples, the launcher
//! packages them into a tuning job, and the poller promotes the resulting
//! model once the job finishes. All coordination state lives in the external
//! settings store; there is no in-process scheduler or shared memory between
//! invocations.

mod collector;
mod launcher;
mod model_select;
mod poller;

pub use collector::{collect_sample, CollectOutcome, SampleSubmission};
pub use launcher::{launch, LaunchOutcome};
pub use model_select::resolve_model;
pub use poller::{poll, PollOutcome};

use thiserror::Error;

/// Model identifier currently promoted for report generation. Absent means
/// "use the default model". Written only by the poller.
pub const KEY_ACTIVE_MODEL: &str = "active_finetuned_model";

/// Handle of the in-flight tuning job. Absent means no job is running.
pub const KEY_CURRENT_JOB: &str = "current_finetune_job_id";

/// Human-readable mirror of the job-id key's presence.
pub const KEY_IN_PROGRESS: &str = "finetune_in_progress";

/// Accumulated-sample threshold that triggers a new launch. Best-effort
/// batching: two collectors racing a boundary may both or neither fire.
pub const BATCH_SIZE: u64 = 5;

/// Inference model used when no fine-tuned model has been promoted yet.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Base model every tuning job starts from.
pub const FINETUNE_BASE_MODEL: &str = "gpt-4o-mini-2024-07-18";

#[derive(Debug, Error)]
pub enum FinetuneError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] stores::StoreError),

    #[error(transparent)]
    Llm(#[from] llm::LlmError),

    #[error("training file serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FinetuneError>;
