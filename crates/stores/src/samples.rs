use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// A qualifying training sample as submitted by the collector. The store
/// assigns id and created_at on insert.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSample {
    pub text: String,
    pub ratings: serde_json::Map<String, serde_json::Value>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    pub text: String,
    pub ratings: serde_json::Map<String, serde_json::Value>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Append-only record store for training samples. Records are never mutated
/// or deleted here; retention is an external concern.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn insert(&self, sample: NewSample) -> Result<Sample>;
    async fn count(&self) -> Result<u64>;
    /// All samples, oldest first. Ordering matters only for reproducibility
    /// of the training file.
    async fn list_all_ordered(&self) -> Result<Vec<Sample>>;
}

/// In-memory sample store (for testing and demos)
#[derive(Clone, Default)]
pub struct InMemorySampleStore {
    data: Arc<RwLock<Vec<Sample>>>,
}

impl InMemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SampleStore for InMemorySampleStore {
    async fn insert(&self, sample: NewSample) -> Result<Sample> {
        let rec = Sample {
            id: Uuid::new_v4(),
            text: sample.text,
            ratings: sample.ratings,
            metadata: sample.metadata,
            created_at: Utc::now(),
        };
        let mut data = self.data.write().unwrap();
        data.push(rec.clone());
        Ok(rec)
    }

    async fn count(&self) -> Result<u64> {
        let data = self.data.read().unwrap();
        Ok(data.len() as u64)
    }

    async fn list_all_ordered(&self) -> Result<Vec<Sample>> {
        let mut out = self.data.read().unwrap().clone();
        out.sort_by_key(|s| s.created_at);
        Ok(out)
    }
}
