use stores::SettingsStore;
use tracing::warn;

use crate::{DEFAULT_MODEL, KEY_ACTIVE_MODEL};

/// Resolve the model to use for report generation. Falls back to the default
/// model when no fine-tuned model has been promoted or when the settings
/// read fails; generation must proceed regardless, so the failure is logged
/// rather than surfaced.
pub async fn resolve_model(settings: &dyn SettingsStore) -> String {
    match settings.get(KEY_ACTIVE_MODEL).await {
        Ok(Some(model)) if !model.trim().is_empty() => model,
        Ok(_) => DEFAULT_MODEL.to_string(),
        Err(e) => {
            warn!(error = %e, "active model lookup failed, using default model");
            DEFAULT_MODEL.to_string()
        }
    }
}
