use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// One fine-tuning training record: `{"messages": [...]}`, serialized as a
/// single line of the uploaded JSONL file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub messages: Vec<ChatMessage>,
}

/// Serialize training examples as newline-delimited JSON, one record per
/// line. Embedded newlines and quotes in message content stay inside the
/// JSON string escaping, so the file always splits cleanly on `\n`.
pub fn render_training_file(examples: &[TrainingExample]) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    for ex in examples {
        serde_json::to_writer(&mut out, ex)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Tuning-job state as reported by the provider. Anything outside the four
/// known states is carried through verbatim and treated as non-terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Other(String),
}

impl JobState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => Self::Queued,
            "running" => Self::Running,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Clone, Debug)]
pub struct TuningJobStatus {
    pub state: JobState,
    /// Present once a succeeded job has produced a model identifier.
    pub fine_tuned_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_file_round_trips_newlines_and_quotes() {
        let text = "Section 1: \"Introduction\"\nLine two contains a \\ backslash.";
        let example = TrainingExample {
            messages: vec![
                ChatMessage::system("system instruction"),
                ChatMessage::user("user instruction"),
                ChatMessage::assistant(text),
            ],
        };

        let file = render_training_file(&[example.clone(), example.clone()]).unwrap();
        let rendered = String::from_utf8(file).unwrap();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: TrainingExample = serde_json::from_str(line).unwrap();
            assert_eq!(parsed, example);
            assert_eq!(parsed.messages[2].content, text);
        }
    }

    #[test]
    fn job_state_parses_known_and_unknown_statuses() {
        assert_eq!(JobState::parse("succeeded"), JobState::Succeeded);
        assert_eq!(JobState::parse("failed"), JobState::Failed);
        assert_eq!(JobState::parse("queued"), JobState::Queued);
        assert!(!JobState::parse("queued").is_terminal());

        let other = JobState::parse("validating_files");
        assert_eq!(other, JobState::Other("validating_files".to_string()));
        assert!(!other.is_terminal());
        assert_eq!(other.as_str(), "validating_files");
    }
}
