use async_trait::async_trait;
use bytes::Bytes;

use crate::{ChatMessage, Result, TuningJobStatus};

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Complete a chat prompt with the given model.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;

    /// Upload a training dataset, returning the provider's file identifier.
    async fn upload_dataset(&self, content: Bytes, purpose: &str) -> Result<String>;

    /// Start an asynchronous tuning job, returning its handle.
    async fn create_tuning_job(&self, base_model: &str, dataset_id: &str) -> Result<String>;

    /// Current status of a tuning job by handle.
    async fn job_status(&self, job_id: &str) -> Result<TuningJobStatus>;

    /// Cheap reachability check, used at service startup.
    async fn ping(&self) -> Result<()>;
}
