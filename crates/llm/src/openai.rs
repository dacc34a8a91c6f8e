use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;

use crate::{ChatMessage, InferenceClient, JobState, LlmError, Result, TuningJobStatus};

/// OpenAI-compatible HTTP client covering chat completions and the
/// fine-tuning endpoints (files, jobs).
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn ensure_ok(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(LlmError::Response {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let resp = self
            .client
            .post(self.url("/v1/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json: serde_json::Value = Self::ensure_ok(resp).await?.json().await?;

        json.pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::Decode("completion response had no message content".to_string()))
    }

    async fn upload_dataset(&self, content: Bytes, purpose: &str) -> Result<String> {
        let part = multipart::Part::bytes(content.to_vec())
            .file_name("training_data.jsonl")
            .mime_str("application/jsonl")
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        let form = multipart::Form::new()
            .text("purpose", purpose.to_string())
            .part("file", part);

        let resp = self
            .client
            .post(self.url("/v1/files"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let json: serde_json::Value = Self::ensure_ok(resp).await?.json().await?;

        json.get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::Decode("file upload response had no id".to_string()))
    }

    async fn create_tuning_job(&self, base_model: &str, dataset_id: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": base_model,
            "training_file": dataset_id,
        });

        let resp = self
            .client
            .post(self.url("/v1/fine_tuning/jobs"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json: serde_json::Value = Self::ensure_ok(resp).await?.json().await?;

        json.get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::Decode("tuning job response had no id".to_string()))
    }

    async fn job_status(&self, job_id: &str) -> Result<TuningJobStatus> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/fine_tuning/jobs/{job_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let json: serde_json::Value = Self::ensure_ok(resp).await?.json().await?;

        let raw = json
            .get("status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| LlmError::Decode("job status response had no status".to_string()))?;
        let fine_tuned_model = json
            .get("fine_tuned_model")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(TuningJobStatus {
            state: JobState::parse(raw),
            fine_tuned_model,
        })
    }

    async fn ping(&self) -> Result<()> {
        let resp = self
            .client
            .get(self.url("/v1/models"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::ensure_ok(resp).await?;
        Ok(())
    }
}
