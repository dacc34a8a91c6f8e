use anyhow::{bail, Context, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,

    /// Base URL of the PostgREST store service (settings + samples).
    pub store_url: String,
    pub store_api_key: String,

    pub openai_base_url: String,
    pub openai_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let store_url = get("STORE_URL")?;
        let store_api_key = get("STORE_API_KEY")?;
        let openai_api_key = get("OPENAI_API_KEY")?;
        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let bind_addr =
            std::env::var("REPORTD_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Tiny sanity checks (fail fast, fail loud)
        if !store_url.starts_with("http://") && !store_url.starts_with("https://") {
            bail!("STORE_URL must start with http:// or https://");
        }
        if !openai_base_url.starts_with("http://") && !openai_base_url.starts_with("https://") {
            bail!("OPENAI_BASE_URL must start with http:// or https://");
        }

        Ok(Self {
            bind_addr,
            store_url,
            store_api_key,
            openai_base_url,
            openai_api_key,
        })
    }
}

fn get(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Missing required env var: {key}"))
}
