//! Transcription orchestrator.
//!
//! Chooses between the synchronous and asynchronous paths, drives the
//! submit/poll cycle, and turns every outcome into either a
//! [`TranscriptOutput`] or a structured error.

use crate::config::Settings;
use crate::error::{AsrError, ErrorKind, Result};
use crate::transcription::{
    AsrApi, AudioFormat, PollPolicy, PollState, SubmitOptions, SyncTranscriber, TaskPoller,
    TaskSnapshot, TaskStatus, TaskSubmitter, TencentAsrClient, TranscriptOutput,
    TranscriptionMode, TranscriptionTask,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct TranscribeOptions {
    pub mode: TranscriptionMode,
    /// Format hint; falls back to the configured default.
    pub format: Option<AudioFormat>,
}

impl TranscribeOptions {
    pub fn sync() -> Self {
        Self {
            mode: TranscriptionMode::Sync,
            format: None,
        }
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// The main orchestrator for transcription requests.
///
/// Holds only read-only collaborators, so one instance can be shared across
/// concurrent requests behind an `Arc`.
pub struct Orchestrator {
    submitter: TaskSubmitter,
    poller: TaskPoller,
    sync: SyncTranscriber,
    default_format: AudioFormat,
}

impl Orchestrator {
    /// Create an orchestrator talking to Tencent Cloud with credentials from `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let credential = Arc::new(settings.credential()?);
        let client = TencentAsrClient::from_settings(settings, credential)?;
        info!(
            endpoint = %settings.tencent.endpoint,
            region = %settings.tencent.region,
            "Using Tencent Cloud ASR"
        );
        Ok(Self::with_api(Arc::new(client), settings))
    }

    /// Create an orchestrator over any [`AsrApi`] implementation.
    pub fn with_api(api: Arc<dyn AsrApi>, settings: &Settings) -> Self {
        let t = &settings.transcription;
        Self {
            submitter: TaskSubmitter::new(api.clone(), SubmitOptions::from(t)),
            poller: TaskPoller::new(api.clone(), PollPolicy::from(t)),
            sync: SyncTranscriber::new(api)
                .with_max_bytes(t.sync_max_bytes)
                .with_engine(t.engine_model_type.clone()),
            default_format: t.default_format(),
        }
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        self.poller.policy()
    }

    /// Transcribe `audio`, waiting until the result is available.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        options: &TranscribeOptions,
    ) -> Result<TranscriptOutput> {
        self.transcribe_with_cancel(audio, options, &CancellationToken::new())
            .await
    }

    /// [`Self::transcribe`] that stops waiting once `cancel` fires.
    #[instrument(
        skip(self, audio, cancel),
        fields(audio_bytes = audio.len(), mode = %options.mode)
    )]
    pub async fn transcribe_with_cancel(
        &self,
        audio: &[u8],
        options: &TranscribeOptions,
        cancel: &CancellationToken,
    ) -> Result<TranscriptOutput> {
        if audio.is_empty() {
            return Err(AsrError::Validation("No audio file uploaded".to_string()));
        }
        let format = options.format.as_ref().unwrap_or(&self.default_format);

        match options.mode {
            TranscriptionMode::Sync => {
                let text = tokio::select! {
                    _ = cancel.cancelled() => return Err(AsrError::Cancelled),
                    text = self.sync.transcribe(audio, format) => text?,
                };
                Ok(TranscriptOutput::new(text, None, TranscriptionMode::Sync))
            }
            TranscriptionMode::Async => self.transcribe_async(audio, format, cancel).await,
        }
    }

    async fn transcribe_async(
        &self,
        audio: &[u8],
        format: &AudioFormat,
        cancel: &CancellationToken,
    ) -> Result<TranscriptOutput> {
        let task_id = tokio::select! {
            _ = cancel.cancelled() => return Err(AsrError::Cancelled),
            id = self.submitter.submit(audio, format) => id?,
        };
        let mut task = TranscriptionTask::new(task_id);

        let outcome = self.poller.poll(task_id, cancel).await?;

        match outcome.state {
            PollState::Succeeded { text, .. } => {
                task.transition(TaskStatus::Succeeded, Some(text), None);
                let raw = task.result_text.take().unwrap_or_default();
                info!(
                    task_id,
                    attempts = outcome.attempts,
                    elapsed_ms = (chrono::Utc::now() - task.submitted_at).num_milliseconds(),
                    "Transcription succeeded"
                );
                Ok(TranscriptOutput::new(raw, Some(task_id), TranscriptionMode::Async))
            }
            state => {
                if let PollState::Failed { message } = &state {
                    task.transition(TaskStatus::Failed, None, Some(message.clone()));
                }
                let err = state
                    .failure()
                    .unwrap_or(AsrError::Exhausted {
                        attempts: outcome.attempts,
                    });
                warn!(
                    task_id,
                    state = state.label(),
                    error = %err,
                    "Transcription did not succeed"
                );
                Err(AsrError::TranscriptionFailed {
                    kind: err.kind(),
                    message: err.public_message(),
                })
            }
        }
    }

    /// Current status of a task obtained earlier. Never submits anything.
    pub async fn task_status(&self, task_id: u64) -> Result<TaskSnapshot> {
        self.poller.status(task_id).await
    }
}

/// Caller-facing result of a transcription or status lookup.
///
/// `InProgress` only comes from status lookups of tasks that are still
/// waiting or running: `{"success": false, "taskId": .., "status": "pending"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TranscriptionReport {
    Success {
        success: bool,
        text: String,
        #[serde(rename = "rawText")]
        raw_text: String,
        #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
        task_id: Option<u64>,
        status: String,
    },
    Failure {
        success: bool,
        #[serde(rename = "errorKind")]
        error_kind: ErrorKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    InProgress {
        success: bool,
        #[serde(rename = "taskId")]
        task_id: u64,
        status: String,
    },
}

impl TranscriptionReport {
    pub fn from_output(output: &TranscriptOutput) -> Self {
        TranscriptionReport::Success {
            success: true,
            text: output.cleaned_text.clone(),
            raw_text: output.raw_text.clone(),
            task_id: output.task_id,
            status: "succeeded".to_string(),
        }
    }

    /// Status lookups report the task's own status, succeeded or not.
    pub fn from_snapshot(snapshot: &TaskSnapshot) -> Self {
        match snapshot.status {
            TaskStatus::Failed => TranscriptionReport::Failure {
                success: false,
                error_kind: ErrorKind::RemoteRejected,
                message: snapshot
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "recognition failed".to_string()),
                code: None,
            },
            TaskStatus::Succeeded => {
                let raw = snapshot.result_text.clone().unwrap_or_default();
                TranscriptionReport::Success {
                    success: true,
                    text: crate::transcription::normalize::clean(&raw),
                    raw_text: raw,
                    task_id: Some(snapshot.task_id),
                    status: "succeeded".to_string(),
                }
            }
            TaskStatus::Pending | TaskStatus::Running => TranscriptionReport::InProgress {
                success: false,
                task_id: snapshot.task_id,
                status: format!("{:?}", snapshot.status).to_lowercase(),
            },
        }
    }

    /// Error report. Provider codes are included only in diagnostic mode.
    pub fn from_error(err: &AsrError, diagnostics: bool) -> Self {
        let code = match err {
            AsrError::RemoteRejected { code, .. } if diagnostics => Some(code.clone()),
            _ => None,
        };
        TranscriptionReport::Failure {
            success: false,
            error_kind: err.kind(),
            message: err.public_message(),
            code,
        }
    }

    pub fn from_result(result: &Result<TranscriptOutput>, diagnostics: bool) -> Self {
        match result {
            Ok(output) => Self::from_output(output),
            Err(e) => Self::from_error(e, diagnostics),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranscriptionReport::Success { .. })
    }
}
