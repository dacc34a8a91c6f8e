//! External-store clients: durable key/value settings and the append-only
//! training-sample store. Both are consumed behind object-safe traits so the
//! lifecycle core can be exercised against in-memory implementations.

mod rest;
mod samples;
mod settings;

pub use rest::{RestSampleStore, RestSettingsStore};
pub use samples::{InMemorySampleStore, NewSample, Sample, SampleStore};
pub use settings::{InMemorySettingsStore, SettingsStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Response { status: u16, body: String },

    #[error("store response decode failed: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
