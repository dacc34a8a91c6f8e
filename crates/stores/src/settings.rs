use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::Result;

/// Durable key -> string map. Each operation is independently atomic;
/// last write wins. No caching in front of it: concurrent invocations of
/// the service never share memory, the store is the shared state.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn upsert(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory settings map (for testing and demos)
#[derive(Clone, Default)]
pub struct InMemorySettingsStore {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self.data.read().unwrap();
        Ok(data.get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.write().unwrap();
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_overwrites_and_delete_removes() {
        let store = InMemorySettingsStore::new();
        assert_eq!(store.get("active_finetuned_model").await.unwrap(), None);

        store.upsert("active_finetuned_model", "ft:one").await.unwrap();
        store.upsert("active_finetuned_model", "ft:two").await.unwrap();
        assert_eq!(
            store.get("active_finetuned_model").await.unwrap(),
            Some("ft:two".to_string())
        );

        store.delete("active_finetuned_model").await.unwrap();
        assert_eq!(store.get("active_finetuned_model").await.unwrap(), None);
    }
}
