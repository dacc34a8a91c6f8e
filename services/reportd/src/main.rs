use std::sync::Arc;

use anyhow::{Context, Result};
use llm::{InferenceClient, OpenAiClient};
use stores::{RestSampleStore, RestSettingsStore, SettingsStore};
use tracing::info;

use reportd::config::AppConfig;
use reportd::state::AppState;
use reportd::weather::OpenMeteoClient;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    let settings = Arc::new(RestSettingsStore::new(
        cfg.store_url.clone(),
        cfg.store_api_key.clone(),
    ));
    let samples = Arc::new(RestSampleStore::new(
        cfg.store_url.clone(),
        cfg.store_api_key.clone(),
    ));
    let inference = Arc::new(OpenAiClient::new(
        cfg.openai_base_url.clone(),
        cfg.openai_api_key.clone(),
    ));

    // Fail fast if a collaborator is unreachable.
    startup_checks(settings.as_ref(), inference.as_ref()).await?;

    let state = Arc::new(AppState {
        settings,
        samples,
        inference,
        weather: Arc::new(OpenMeteoClient::new()),
    });

    let app = reportd::build_router(state);

    info!("reportd listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind_addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn startup_checks(
    settings: &dyn SettingsStore,
    inference: &dyn InferenceClient,
) -> Result<()> {
    settings
        .get(finetune::KEY_ACTIVE_MODEL)
        .await
        .context("Settings store check failed")?;
    info!("settings store: ok");

    inference
        .ping()
        .await
        .context("Inference provider check failed")?;
    info!("inference provider: ok");

    Ok(())
}
