use std::sync::Arc;

use llm::InferenceClient;
use serde_json::Value;
use stores::{NewSample, SampleStore, SettingsStore};
use tracing::{info, warn};

use crate::{launcher, FinetuneError, Result, BATCH_SIZE};

/// A finished report plus its per-section quality ratings, as received from
/// the review surface. Fields are optional here so presence checks happen in
/// one place, before any store access.
#[derive(Clone, Debug, Default)]
pub struct SampleSubmission {
    pub final_report_text: Option<String>,
    pub ratings: Option<serde_json::Map<String, Value>>,
    pub metadata: Option<serde_json::Map<String, Value>>,
}

#[derive(Clone, Debug)]
pub enum CollectOutcome {
    /// At least one rating fell below the threshold. Expected common case,
    /// not an error.
    NotStored,
    Stored {
        /// Total sample count after the insert, when the count read
        /// succeeded.
        count: Option<u64>,
        fine_tune_triggered: bool,
    },
}

fn rating_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Decide whether a finished report qualifies as a training sample, persist
/// it if so, and fire the launcher when the accumulated count crosses a
/// batch boundary.
pub async fn collect_sample(
    settings: Arc<dyn SettingsStore>,
    samples: Arc<dyn SampleStore>,
    inference: Arc<dyn InferenceClient>,
    submission: SampleSubmission,
) -> Result<CollectOutcome> {
    let text = submission
        .final_report_text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| FinetuneError::Validation("finalReportText is required".to_string()))?;
    let ratings = submission
        .ratings
        .filter(|r| !r.is_empty())
        .ok_or_else(|| FinetuneError::Validation("ratings must be a non-empty object".to_string()))?;

    // Non-numeric values coerce to nothing and fail the threshold.
    let all_above_nine = ratings
        .values()
        .all(|v| rating_value(v).is_some_and(|score| score >= 9.0));
    if !all_above_nine {
        return Ok(CollectOutcome::NotStored);
    }

    // Losing a qualifying sample silently is unacceptable, so insert
    // failures propagate.
    let stored = samples
        .insert(NewSample {
            text,
            ratings,
            metadata: submission.metadata.unwrap_or_default(),
        })
        .await?;
    info!(sample_id = %stored.id, "training sample stored");

    // The sample is durably saved from here on; nothing below may fail the
    // storage response.
    let count = match samples.count().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "sample count read failed, skipping batch check");
            return Ok(CollectOutcome::Stored {
                count: None,
                fine_tune_triggered: false,
            });
        }
    };

    let mut triggered = false;
    if count > 0 && count % BATCH_SIZE == 0 {
        triggered = true;
        let reason = format!("sample count reached {count}");
        tokio::spawn(async move {
            if let Err(e) = launcher::launch(settings, samples, inference, &reason).await {
                warn!(error = %e, "fine-tune launch trigger failed");
            }
        });
    }

    Ok(CollectOutcome::Stored {
        count: Some(count),
        fine_tune_triggered: triggered,
    })
}
