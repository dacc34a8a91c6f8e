use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Map, Value};

use finetune::{
    collect_sample, launch, poll, resolve_model, CollectOutcome, FinetuneError, LaunchOutcome,
    PollOutcome, SampleSubmission, DEFAULT_MODEL, FINETUNE_BASE_MODEL, KEY_ACTIVE_MODEL,
    KEY_CURRENT_JOB, KEY_IN_PROGRESS,
};
use llm::{ChatMessage, InferenceClient, JobState, LlmError, TrainingExample, TuningJobStatus};
use stores::{
    InMemorySampleStore, InMemorySettingsStore, NewSample, Sample, SampleStore, SettingsStore,
    StoreError,
};

#[derive(Default)]
struct FakeInference {
    uploads: Mutex<Vec<Bytes>>,
    jobs: Mutex<Vec<(String, String)>>,
    status: Mutex<Option<TuningJobStatus>>,
    fail_upload: bool,
    fail_status: bool,
}

impl FakeInference {
    fn with_status(state: JobState, fine_tuned_model: Option<&str>) -> Self {
        let fake = Self::default();
        *fake.status.lock().unwrap() = Some(TuningJobStatus {
            state,
            fine_tuned_model: fine_tuned_model.map(str::to_string),
        });
        fake
    }

    fn remote_error() -> LlmError {
        LlmError::Response {
            status: 500,
            body: "provider unavailable".to_string(),
        }
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn complete(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _temperature: f32,
        _max_tokens: u32,
    ) -> llm::Result<String> {
        Ok("generated section".to_string())
    }

    async fn upload_dataset(&self, content: Bytes, _purpose: &str) -> llm::Result<String> {
        if self.fail_upload {
            return Err(Self::remote_error());
        }
        self.uploads.lock().unwrap().push(content);
        Ok("file-001".to_string())
    }

    async fn create_tuning_job(&self, base_model: &str, dataset_id: &str) -> llm::Result<String> {
        self.jobs
            .lock()
            .unwrap()
            .push((base_model.to_string(), dataset_id.to_string()));
        Ok("ftjob-001".to_string())
    }

    async fn job_status(&self, _job_id: &str) -> llm::Result<TuningJobStatus> {
        if self.fail_status {
            return Err(Self::remote_error());
        }
        Ok(self
            .status
            .lock()
            .unwrap()
            .clone()
            .expect("no status configured"))
    }

    async fn ping(&self) -> llm::Result<()> {
        Ok(())
    }
}

/// Settings store whose every operation fails, for fallback paths.
struct FailingSettings;

#[async_trait]
impl SettingsStore for FailingSettings {
    async fn get(&self, _key: &str) -> stores::Result<Option<String>> {
        Err(StoreError::Response {
            status: 500,
            body: "settings store down".to_string(),
        })
    }

    async fn upsert(&self, _key: &str, _value: &str) -> stores::Result<()> {
        Err(StoreError::Response {
            status: 500,
            body: "settings store down".to_string(),
        })
    }

    async fn delete(&self, _key: &str) -> stores::Result<()> {
        Err(StoreError::Response {
            status: 500,
            body: "settings store down".to_string(),
        })
    }
}

/// Sample store whose inserts are durable but whose count reads fail.
struct CountFailingSamples {
    inner: InMemorySampleStore,
}

#[async_trait]
impl SampleStore for CountFailingSamples {
    async fn insert(&self, sample: NewSample) -> stores::Result<Sample> {
        self.inner.insert(sample).await
    }

    async fn count(&self) -> stores::Result<u64> {
        Err(StoreError::Response {
            status: 500,
            body: "sample store down".to_string(),
        })
    }

    async fn list_all_ordered(&self) -> stores::Result<Vec<Sample>> {
        self.inner.list_all_ordered().await
    }
}

fn ratings(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn submission(text: &str, r: Map<String, Value>) -> SampleSubmission {
    SampleSubmission {
        final_report_text: Some(text.to_string()),
        ratings: Some(r),
        metadata: None,
    }
}

fn qualifying(text: &str) -> SampleSubmission {
    submission(text, ratings(&[("introduction", json!(9)), ("background", json!(10))]))
}

// ---- collector ----

#[tokio::test]
async fn qualifying_sample_is_stored() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    let outcome = collect_sample(settings, samples.clone(), inference, qualifying("full report"))
        .await
        .unwrap();

    match outcome {
        CollectOutcome::Stored {
            count,
            fine_tune_triggered,
        } => {
            assert_eq!(count, Some(1));
            assert!(!fine_tune_triggered);
        }
        other => panic!("expected Stored, got {other:?}"),
    }
    assert_eq!(samples.count().await.unwrap(), 1);
}

#[tokio::test]
async fn below_threshold_is_not_stored() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    let outcome = collect_sample(
        settings,
        samples.clone(),
        inference,
        submission("full report", ratings(&[("introduction", json!(8))])),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, CollectOutcome::NotStored));
    assert_eq!(samples.count().await.unwrap(), 0);
}

#[tokio::test]
async fn non_numeric_rating_fails_the_threshold() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    let outcome = collect_sample(
        settings,
        samples.clone(),
        inference,
        submission(
            "full report",
            ratings(&[("introduction", json!(10)), ("background", json!("excellent"))]),
        ),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, CollectOutcome::NotStored));
    assert_eq!(samples.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_fields_fail_validation_without_store_access() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    let missing_text = SampleSubmission {
        final_report_text: None,
        ratings: Some(ratings(&[("introduction", json!(9))])),
        metadata: None,
    };
    let err = collect_sample(
        settings.clone(),
        samples.clone(),
        inference.clone(),
        missing_text,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FinetuneError::Validation(_)));

    let empty_ratings = submission("full report", Map::new());
    let err = collect_sample(settings, samples.clone(), inference, empty_ratings)
        .await
        .unwrap_err();
    assert!(matches!(err, FinetuneError::Validation(_)));

    assert_eq!(samples.count().await.unwrap(), 0);
}

#[tokio::test]
async fn count_read_failure_after_a_durable_insert_still_reports_stored() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(CountFailingSamples {
        inner: InMemorySampleStore::new(),
    });
    let inference = Arc::new(FakeInference::default());

    let outcome = collect_sample(settings, samples.clone(), inference, qualifying("full report"))
        .await
        .unwrap();

    match outcome {
        CollectOutcome::Stored {
            count,
            fine_tune_triggered,
        } => {
            assert_eq!(count, None);
            assert!(!fine_tune_triggered);
        }
        other => panic!("expected Stored, got {other:?}"),
    }
    // The sample itself was durably saved before the count read failed.
    assert_eq!(samples.inner.count().await.unwrap(), 1);
}

#[tokio::test]
async fn launch_triggers_only_on_positive_multiples_of_the_batch_size() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    for i in 1..=12u64 {
        let outcome = collect_sample(
            settings.clone(),
            samples.clone(),
            inference.clone(),
            qualifying(&format!("report {i}")),
        )
        .await
        .unwrap();

        match outcome {
            CollectOutcome::Stored {
                count,
                fine_tune_triggered,
            } => {
                assert_eq!(count, Some(i));
                assert_eq!(fine_tune_triggered, i % 5 == 0, "count {i}");
            }
            other => panic!("expected Stored, got {other:?}"),
        }
    }
}

// ---- launcher ----

#[tokio::test]
async fn launch_with_no_samples_is_a_noop() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    let outcome = launch(settings.clone(), samples, inference, "manual")
        .await
        .unwrap();

    assert!(matches!(outcome, LaunchOutcome::NoSamples));
    assert_eq!(settings.get(KEY_CURRENT_JOB).await.unwrap(), None);
    assert_eq!(settings.get(KEY_IN_PROGRESS).await.unwrap(), None);
}

#[tokio::test]
async fn launch_packages_samples_and_records_the_job_handle() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    let texts = [
        "First report body.",
        "Second report:\nline two with an embedded \"quote\".",
    ];
    for text in texts {
        samples
            .insert(NewSample {
                text: text.to_string(),
                ratings: ratings(&[("introduction", json!(9))]),
                metadata: Map::new(),
            })
            .await
            .unwrap();
    }

    let outcome = launch(settings.clone(), samples, inference.clone(), "batch of 5")
        .await
        .unwrap();
    match outcome {
        LaunchOutcome::Started { job_id } => assert_eq!(job_id, "ftjob-001"),
        other => panic!("expected Started, got {other:?}"),
    }

    // One upload, one JSONL record per sample, oldest first.
    let uploads = inference.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    let body = String::from_utf8(uploads[0].to_vec()).unwrap();
    let records: Vec<TrainingExample> = body
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    for (record, text) in records.iter().zip(texts) {
        assert_eq!(record.messages.len(), 3);
        assert_eq!(record.messages[0].role, "system");
        assert_eq!(record.messages[1].role, "user");
        assert_eq!(record.messages[2].role, "assistant");
        assert_eq!(record.messages[2].content, text);
    }

    let jobs = inference.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].0, FINETUNE_BASE_MODEL);
    assert_eq!(jobs[0].1, "file-001");

    assert_eq!(
        settings.get(KEY_CURRENT_JOB).await.unwrap(),
        Some("ftjob-001".to_string())
    );
    assert_eq!(
        settings.get(KEY_IN_PROGRESS).await.unwrap(),
        Some("true".to_string())
    );
}

#[tokio::test]
async fn launch_upload_failure_writes_no_job_state() {
    let settings = Arc::new(InMemorySettingsStore::new());
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference {
        fail_upload: true,
        ..FakeInference::default()
    });

    samples
        .insert(NewSample {
            text: "report".to_string(),
            ratings: Map::new(),
            metadata: Map::new(),
        })
        .await
        .unwrap();

    let err = launch(settings.clone(), samples, inference, "manual")
        .await
        .unwrap_err();
    assert!(matches!(err, FinetuneError::Llm(_)));

    assert_eq!(settings.get(KEY_CURRENT_JOB).await.unwrap(), None);
    assert_eq!(settings.get(KEY_IN_PROGRESS).await.unwrap(), None);
}

#[tokio::test]
async fn launch_handle_persistence_failure_propagates_after_submission() {
    let settings = Arc::new(FailingSettings);
    let samples = Arc::new(InMemorySampleStore::new());
    let inference = Arc::new(FakeInference::default());

    samples
        .insert(NewSample {
            text: "report".to_string(),
            ratings: Map::new(),
            metadata: Map::new(),
        })
        .await
        .unwrap();

    let err = launch(settings, samples, inference.clone(), "manual")
        .await
        .unwrap_err();
    assert!(matches!(err, FinetuneError::Store(_)));

    // Accepted partial state: the job was already submitted remotely, only
    // the handle write failed.
    assert_eq!(inference.uploads.lock().unwrap().len(), 1);
    assert_eq!(inference.jobs.lock().unwrap().len(), 1);
}

// ---- poller ----

async fn seed_polling_state(settings: &InMemorySettingsStore) {
    settings.upsert(KEY_ACTIVE_MODEL, "ft:old").await.unwrap();
    settings.upsert(KEY_CURRENT_JOB, "ftjob-001").await.unwrap();
    settings.upsert(KEY_IN_PROGRESS, "true").await.unwrap();
}

#[tokio::test]
async fn poll_without_a_job_is_idle() {
    let settings = InMemorySettingsStore::new();
    let inference = FakeInference::default();

    let outcome = poll(&settings, &inference).await.unwrap();
    assert!(matches!(outcome, PollOutcome::Idle));
}

#[tokio::test]
async fn poll_of_a_running_job_mutates_nothing() {
    let settings = InMemorySettingsStore::new();
    seed_polling_state(&settings).await;
    let inference = FakeInference::with_status(JobState::Running, None);

    let outcome = poll(&settings, &inference).await.unwrap();
    match outcome {
        PollOutcome::InProgress { status } => assert_eq!(status, "running"),
        other => panic!("expected InProgress, got {other:?}"),
    }

    assert_eq!(
        settings.get(KEY_ACTIVE_MODEL).await.unwrap(),
        Some("ft:old".to_string())
    );
    assert_eq!(
        settings.get(KEY_CURRENT_JOB).await.unwrap(),
        Some("ftjob-001".to_string())
    );
    assert_eq!(
        settings.get(KEY_IN_PROGRESS).await.unwrap(),
        Some("true".to_string())
    );
}

#[tokio::test]
async fn poll_promotes_the_model_on_success() {
    let settings = InMemorySettingsStore::new();
    seed_polling_state(&settings).await;
    let inference = FakeInference::with_status(JobState::Succeeded, Some("ft:abc123"));

    let outcome = poll(&settings, &inference).await.unwrap();
    match outcome {
        PollOutcome::Promoted { model } => assert_eq!(model, "ft:abc123"),
        other => panic!("expected Promoted, got {other:?}"),
    }

    assert_eq!(
        settings.get(KEY_ACTIVE_MODEL).await.unwrap(),
        Some("ft:abc123".to_string())
    );
    assert_eq!(settings.get(KEY_CURRENT_JOB).await.unwrap(), None);
    assert_eq!(
        settings.get(KEY_IN_PROGRESS).await.unwrap(),
        Some("false".to_string())
    );
}

#[tokio::test]
async fn poll_success_without_a_model_keeps_the_prior_active_model() {
    let settings = InMemorySettingsStore::new();
    seed_polling_state(&settings).await;
    let inference = FakeInference::with_status(JobState::Succeeded, None);

    let outcome = poll(&settings, &inference).await.unwrap();
    assert!(matches!(outcome, PollOutcome::SucceededWithoutModel));

    assert_eq!(
        settings.get(KEY_ACTIVE_MODEL).await.unwrap(),
        Some("ft:old".to_string())
    );
    assert_eq!(settings.get(KEY_CURRENT_JOB).await.unwrap(), None);
    assert_eq!(
        settings.get(KEY_IN_PROGRESS).await.unwrap(),
        Some("false".to_string())
    );
}

#[tokio::test]
async fn poll_of_a_failed_job_clears_without_promoting() {
    let settings = InMemorySettingsStore::new();
    seed_polling_state(&settings).await;
    let inference = FakeInference::with_status(JobState::Failed, None);

    let outcome = poll(&settings, &inference).await.unwrap();
    assert!(matches!(outcome, PollOutcome::Failed));

    assert_eq!(
        settings.get(KEY_ACTIVE_MODEL).await.unwrap(),
        Some("ft:old".to_string())
    );
    assert_eq!(settings.get(KEY_CURRENT_JOB).await.unwrap(), None);
    assert_eq!(
        settings.get(KEY_IN_PROGRESS).await.unwrap(),
        Some("false".to_string())
    );
}

#[tokio::test]
async fn poll_status_query_failure_mutates_nothing() {
    let settings = InMemorySettingsStore::new();
    seed_polling_state(&settings).await;
    let inference = FakeInference {
        fail_status: true,
        ..FakeInference::default()
    };

    let err = poll(&settings, &inference).await.unwrap_err();
    assert!(matches!(err, FinetuneError::Llm(_)));

    assert_eq!(
        settings.get(KEY_CURRENT_JOB).await.unwrap(),
        Some("ftjob-001".to_string())
    );
    assert_eq!(
        settings.get(KEY_IN_PROGRESS).await.unwrap(),
        Some("true".to_string())
    );
}

#[tokio::test]
async fn poll_settings_read_failure_is_a_hard_error() {
    // No status is configured, so a status query here would panic: the
    // failed job-handle read must stop the poll before it reaches the
    // provider.
    let inference = FakeInference::default();

    let err = poll(&FailingSettings, &inference).await.unwrap_err();
    assert!(matches!(err, FinetuneError::Store(_)));
}

// ---- model selection ----

#[tokio::test]
async fn model_resolution_falls_back_to_the_default() {
    let settings = InMemorySettingsStore::new();
    assert_eq!(resolve_model(&settings).await, DEFAULT_MODEL);

    settings.upsert(KEY_ACTIVE_MODEL, "ft:abc123").await.unwrap();
    assert_eq!(resolve_model(&settings).await, "ft:abc123");

    // Read failures are swallowed in favor of the default.
    assert_eq!(resolve_model(&FailingSettings).await, DEFAULT_MODEL);
}
