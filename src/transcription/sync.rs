//! Single-request recognition for short clips.

use super::messages::{SentenceRecognitionRequest, SOURCE_TYPE_INLINE};
use super::{AsrApi, AudioFormat};
use crate::error::{AsrError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Largest raw input accepted on the synchronous path (5 MiB).
pub const SYNC_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Sends `SentenceRecognition`. No task is created and nothing is polled.
pub struct SyncTranscriber {
    api: Arc<dyn AsrApi>,
    max_bytes: usize,
    engine_override: Option<String>,
}

impl SyncTranscriber {
    pub fn new(api: Arc<dyn AsrApi>) -> Self {
        Self {
            api,
            max_bytes: SYNC_MAX_BYTES,
            engine_override: None,
        }
    }

    /// Lower the size bound. Values above [`SYNC_MAX_BYTES`] are capped to it.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        if max_bytes > SYNC_MAX_BYTES {
            warn!(max_bytes, cap = SYNC_MAX_BYTES, "Synchronous limit capped");
        }
        self.max_bytes = max_bytes.min(SYNC_MAX_BYTES);
        self
    }

    pub fn with_engine(mut self, engine: Option<String>) -> Self {
        self.engine_override = engine.filter(|e| !e.is_empty());
        self
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Reject input the synchronous contract cannot carry, before any network use.
    pub fn validate(&self, audio: &[u8]) -> Result<()> {
        if audio.is_empty() {
            return Err(AsrError::Validation("No audio data supplied".to_string()));
        }
        if audio.len() > self.max_bytes {
            return Err(AsrError::Validation(format!(
                "Audio is {} bytes, the synchronous limit is {} bytes",
                audio.len(),
                self.max_bytes
            )));
        }
        Ok(())
    }

    pub fn build_request(&self, audio: &[u8], format: &AudioFormat) -> SentenceRecognitionRequest {
        SentenceRecognitionRequest {
            eng_service_type: self
                .engine_override
                .clone()
                .unwrap_or_else(|| format.engine_model().to_string()),
            source_type: SOURCE_TYPE_INLINE,
            voice_format: format.voice_format.clone(),
            data: STANDARD.encode(audio),
            data_len: audio.len(),
        }
    }

    /// Recognize `audio` in one round trip and return the provider's text.
    #[instrument(
        skip(self, audio),
        fields(audio_bytes = audio.len(), format = %format.voice_format)
    )]
    pub async fn transcribe(&self, audio: &[u8], format: &AudioFormat) -> Result<String> {
        self.validate(audio)?;

        let request = self.build_request(audio, format);
        let response = self.api.sentence_recognition(&request).await?;

        info!(
            audio_duration_ms = response.audio_duration.unwrap_or_default(),
            chars = response.result.chars().count(),
            "Sentence recognized"
        );
        Ok(response.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::messages::SentenceRecognitionResponse;
    use crate::transcription::testing::ScriptedApi;

    #[tokio::test]
    async fn test_rejects_one_byte_over_limit() {
        let api = Arc::new(ScriptedApi::default());
        let sync = SyncTranscriber::new(api.clone());
        let audio = vec![0u8; SYNC_MAX_BYTES + 1];

        let err = sync.transcribe(&audio, &AudioFormat::default()).await.unwrap_err();
        assert!(matches!(err, AsrError::Validation(_)));
        assert_eq!(api.sentence_calls(), 0);
    }

    #[tokio::test]
    async fn test_accepts_exactly_limit() {
        let api = Arc::new(ScriptedApi::default());
        let sync = SyncTranscriber::new(api.clone());
        let audio = vec![0u8; SYNC_MAX_BYTES];

        let text = sync.transcribe(&audio, &AudioFormat::default()).await.unwrap();
        assert_eq!(text, "scripted sentence");
        assert_eq!(api.sentence_calls(), 1);
        assert_eq!(api.submit_calls(), 0);
        assert_eq!(api.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_payload_shape() {
        let api = Arc::new(ScriptedApi::default());
        SyncTranscriber::new(api.clone())
            .transcribe(b"abc", &AudioFormat::new("mp3", 8000))
            .await
            .unwrap();

        let sent = api.last_sentence().unwrap();
        assert_eq!(sent.eng_service_type, "8k_zh");
        assert_eq!(sent.voice_format, "mp3");
        assert_eq!(sent.data, "YWJj");
        assert_eq!(sent.data_len, 3);
    }

    #[tokio::test]
    async fn test_remote_error_passes_through() {
        let api = Arc::new(ScriptedApi::default().with_sentence(Err(AsrError::remote(
            "FailedOperation.ErrorRecognize",
            "识别失败",
        ))));
        let err = SyncTranscriber::new(api)
            .transcribe(b"abc", &AudioFormat::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AsrError::RemoteRejected { .. }));
    }

    #[tokio::test]
    async fn test_limit_cannot_exceed_five_mib() {
        let api = Arc::new(ScriptedApi::default());
        let sync = SyncTranscriber::new(api.clone()).with_max_bytes(64 * 1024 * 1024);
        assert_eq!(sync.max_bytes(), SYNC_MAX_BYTES);

        let audio = vec![1u8; SYNC_MAX_BYTES + 1];
        let err = sync.transcribe(&audio, &AudioFormat::default()).await.unwrap_err();
        assert!(matches!(err, AsrError::Validation(_)));
        assert_eq!(api.sentence_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_limit() {
        let api = Arc::new(ScriptedApi::default().with_sentence(Ok(SentenceRecognitionResponse {
            result: "ok".to_string(),
            audio_duration: None,
            request_id: None,
        })));
        let sync = SyncTranscriber::new(api).with_max_bytes(4);
        assert!(sync.validate(b"12345").is_err());
        assert_eq!(sync.transcribe(b"1234", &AudioFormat::default()).await.unwrap(), "ok");
    }
}
