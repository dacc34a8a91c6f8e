//! PostgREST-flavored HTTP clients for the settings and sample stores.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{NewSample, Result, Sample, SampleStore, SettingsStore, StoreError};

const SETTINGS_TABLE: &str = "app_settings";
const SAMPLES_TABLE: &str = "training_samples";

#[derive(Clone)]
pub struct RestSettingsStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestSettingsStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{SETTINGS_TABLE}", self.base_url.trim_end_matches('/'))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn ensure_ok(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Response {
        status: status.as_u16(),
        body,
    })
}

#[derive(Deserialize)]
struct SettingRow {
    value: String,
}

#[async_trait]
impl SettingsStore for RestSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let req = self
            .client
            .get(self.table_url())
            .query(&[("select", "value".to_string()), ("key", format!("eq.{key}"))]);
        let resp = ensure_ok(self.authed(req).send().await?).await?;
        let rows: Vec<SettingRow> = resp.json().await?;
        Ok(rows.into_iter().next().map(|r| r.value))
    }

    async fn upsert(&self, key: &str, value: &str) -> Result<()> {
        let req = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "key")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&serde_json::json!({ "key": key, "value": value }));
        ensure_ok(self.authed(req).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let req = self
            .client
            .delete(self.table_url())
            .query(&[("key", format!("eq.{key}"))]);
        ensure_ok(self.authed(req).send().await?).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct RestSampleStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestSampleStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{SAMPLES_TABLE}", self.base_url.trim_end_matches('/'))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl SampleStore for RestSampleStore {
    async fn insert(&self, sample: NewSample) -> Result<Sample> {
        let req = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&sample);
        let resp = ensure_ok(self.authed(req).send().await?).await?;
        let mut rows: Vec<Sample> = resp.json().await?;
        rows.pop()
            .ok_or_else(|| StoreError::Decode("insert returned no representation".to_string()))
    }

    async fn count(&self) -> Result<u64> {
        let req = self
            .client
            .get(self.table_url())
            .query(&[("select", "id")])
            .header("Prefer", "count=exact")
            .header("Range", "0-0");
        let resp = ensure_ok(self.authed(req).send().await?).await?;

        // PostgREST reports the exact total after the slash: "0-0/37"
        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StoreError::Decode("missing content-range header".to_string()))?;
        let total = range
            .rsplit('/')
            .next()
            .and_then(|t| t.parse::<u64>().ok())
            .ok_or_else(|| StoreError::Decode(format!("unparsable content-range: {range}")))?;
        Ok(total)
    }

    async fn list_all_ordered(&self) -> Result<Vec<Sample>> {
        let req = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.asc")]);
        let resp = ensure_ok(self.authed(req).send().await?).await?;
        Ok(resp.json().await?)
    }
}
