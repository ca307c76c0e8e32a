//! Data models for transcription.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Input Types
// ============================================================================

/// Container format and sample-rate hint supplied with uploaded audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Container/codec name as the provider spells it (wav, mp3, m4a, ...).
    pub voice_format: String,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            voice_format: "wav".to_string(),
            sample_rate: 16_000,
        }
    }
}

impl AudioFormat {
    pub fn new(voice_format: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            voice_format: voice_format.into(),
            sample_rate,
        }
    }

    /// Guess the provider's format name from a file name's extension.
    pub fn voice_format_from_name(name: &str) -> Option<String> {
        let ext = std::path::Path::new(name)
            .extension()?
            .to_str()?
            .to_lowercase();
        match ext.as_str() {
            "wav" | "pcm" | "mp3" | "m4a" | "aac" | "amr" | "flac" | "ogg" | "opus" | "speex"
            | "silk" | "3gp" => Some(ext),
            "wave" => Some("wav".to_string()),
            _ => None,
        }
    }

    /// Mandarin engine matching the sample rate.
    pub fn engine_model(&self) -> &'static str {
        if self.sample_rate <= 8_000 {
            "8k_zh"
        } else {
            "16k_zh"
        }
    }
}

/// Which contract the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionMode {
    /// Submit a recognition task and poll until it finishes.
    #[default]
    Async,
    /// Single size-bounded request/response.
    Sync,
}

impl std::str::FromStr for TranscriptionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "async" | "task" => Ok(TranscriptionMode::Async),
            "sync" | "sentence" => Ok(TranscriptionMode::Sync),
            _ => Err(format!("Unknown transcription mode: {}", s)),
        }
    }
}

impl std::fmt::Display for TranscriptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionMode::Async => write!(f, "async"),
            TranscriptionMode::Sync => write!(f, "sync"),
        }
    }
}

// ============================================================================
// Task Types
// ============================================================================

/// Remote task status as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Map the provider's numeric status. Anything other than 0, 2 or 3 counts as running.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => TaskStatus::Pending,
            2 => TaskStatus::Succeeded,
            3 => TaskStatus::Failed,
            _ => TaskStatus::Running,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// Point-in-time view of a remote task, as returned by one status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub task_id: u64,
    pub status: TaskStatus,
    /// Raw numeric status from the provider.
    pub status_code: i64,
    pub status_str: String,
    pub result_text: Option<String>,
    pub error_message: Option<String>,
    /// Audio duration in seconds, once known.
    pub audio_duration: Option<f64>,
}

/// An asynchronous recognition job for the lifetime of one orchestration call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptionTask {
    pub task_id: u64,
    pub submitted_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub result_text: Option<String>,
    pub error_message: Option<String>,
}

impl TranscriptionTask {
    /// A freshly submitted task.
    pub fn new(task_id: u64) -> Self {
        Self {
            task_id,
            submitted_at: Utc::now(),
            status: TaskStatus::Pending,
            result_text: None,
            error_message: None,
        }
    }

    /// Record a new status. Returns false, leaving the task untouched, once it is terminal.
    pub fn transition(
        &mut self,
        status: TaskStatus,
        result_text: Option<String>,
        error_message: Option<String>,
    ) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        match status {
            TaskStatus::Succeeded => self.result_text = Some(result_text.unwrap_or_default()),
            TaskStatus::Failed => self.error_message = error_message,
            TaskStatus::Pending | TaskStatus::Running => {}
        }
        true
    }
}

// ============================================================================
// Output Types
// ============================================================================

/// Final transcript, both as delivered by the provider and with timing annotations removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptOutput {
    pub raw_text: String,
    pub cleaned_text: String,
    /// Remote task id when the asynchronous path was used.
    pub task_id: Option<u64>,
    pub mode: TranscriptionMode,
}

impl TranscriptOutput {
    pub fn new(raw_text: String, task_id: Option<u64>, mode: TranscriptionMode) -> Self {
        let cleaned_text = super::normalize::clean(&raw_text);
        Self {
            raw_text,
            cleaned_text,
            task_id,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TaskStatus::from_code(0), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_code(1), TaskStatus::Running);
        assert_eq!(TaskStatus::from_code(2), TaskStatus::Succeeded);
        assert_eq!(TaskStatus::from_code(3), TaskStatus::Failed);
        assert_eq!(TaskStatus::from_code(42), TaskStatus::Running);
    }

    #[test]
    fn test_engine_model_from_sample_rate() {
        assert_eq!(AudioFormat::new("wav", 8000).engine_model(), "8k_zh");
        assert_eq!(AudioFormat::new("wav", 16000).engine_model(), "16k_zh");
        assert_eq!(AudioFormat::new("mp3", 44100).engine_model(), "16k_zh");
    }

    #[test]
    fn test_voice_format_from_name() {
        assert_eq!(
            AudioFormat::voice_format_from_name("feynman-record-1.wav").as_deref(),
            Some("wav")
        );
        assert_eq!(AudioFormat::voice_format_from_name("talk.MP3").as_deref(), Some("mp3"));
        assert_eq!(AudioFormat::voice_format_from_name("notes.txt"), None);
        assert_eq!(AudioFormat::voice_format_from_name("noext"), None);
    }

    #[test]
    fn test_terminal_task_is_never_updated() {
        let mut task = TranscriptionTask::new(7);
        assert!(task.transition(TaskStatus::Running, None, None));
        assert!(task.transition(TaskStatus::Succeeded, Some("done".into()), None));
        assert!(!task.transition(TaskStatus::Failed, None, Some("late".into())));
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.result_text.as_deref(), Some("done"));
        assert!(task.error_message.is_none());
    }

    #[test]
    fn test_output_cleans_raw_text() {
        let out = TranscriptOutput::new(
            "[0:0.640,0:5.580] hello".to_string(),
            Some(1),
            TranscriptionMode::Async,
        );
        assert_eq!(out.cleaned_text, "hello");
        assert_eq!(out.raw_text, "[0:0.640,0:5.580] hello");
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("sync".parse::<TranscriptionMode>().unwrap(), TranscriptionMode::Sync);
        assert_eq!("ASYNC".parse::<TranscriptionMode>().unwrap(), TranscriptionMode::Async);
        assert!("later".parse::<TranscriptionMode>().is_err());
    }
}
