//! Model inference client: chat completions plus the fine-tuning surface
//! (dataset upload, tuning-job creation, job status).

mod client;
mod openai;
mod types;

pub use client::InferenceClient;
pub use openai::OpenAiClient;
pub use types::{
    render_training_file, ChatMessage, JobState, TrainingExample, TuningJobStatus,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("inference provider returned {status}: {body}")]
    Response { status: u16, body: String },

    #[error("inference response decode failed: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
