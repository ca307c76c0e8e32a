//! Creation of asynchronous recognition tasks.

use super::messages::{CreateRecTaskRequest, SOURCE_TYPE_INLINE};
use super::{AsrApi, AudioFormat};
use crate::config::TranscriptionSettings;
use crate::error::{AsrError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;
use tracing::{info, instrument};

/// Payload parameters that do not depend on the audio itself.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Overrides the engine derived from the sample rate.
    pub engine_model_type: Option<String>,
    pub channel_num: u32,
    /// 0 = plain sentences with timing annotations.
    pub res_text_format: u32,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            engine_model_type: None,
            channel_num: 1,
            res_text_format: 0,
        }
    }
}

impl From<&TranscriptionSettings> for SubmitOptions {
    fn from(settings: &TranscriptionSettings) -> Self {
        Self {
            engine_model_type: settings.engine_model_type.clone().filter(|m| !m.is_empty()),
            channel_num: settings.channel_num,
            res_text_format: settings.res_text_format,
        }
    }
}

/// Sends `CreateRecTask` and hands back the provider's task id.
pub struct TaskSubmitter {
    api: Arc<dyn AsrApi>,
    options: SubmitOptions,
}

impl TaskSubmitter {
    pub fn new(api: Arc<dyn AsrApi>, options: SubmitOptions) -> Self {
        Self { api, options }
    }

    /// Build the request body; `Data` and `DataLen` describe the same bytes.
    pub fn build_request(&self, audio: &[u8], format: &AudioFormat) -> CreateRecTaskRequest {
        let engine = self
            .options
            .engine_model_type
            .clone()
            .unwrap_or_else(|| format.engine_model().to_string());

        CreateRecTaskRequest {
            engine_model_type: engine,
            channel_num: self.options.channel_num,
            res_text_format: self.options.res_text_format,
            source_type: SOURCE_TYPE_INLINE,
            data: STANDARD.encode(audio),
            data_len: audio.len(),
        }
    }

    /// Submit audio for asynchronous recognition.
    #[instrument(
        skip(self, audio),
        fields(audio_bytes = audio.len(), format = %format.voice_format)
    )]
    pub async fn submit(&self, audio: &[u8], format: &AudioFormat) -> Result<u64> {
        if audio.is_empty() {
            return Err(AsrError::Validation("No audio data supplied".to_string()));
        }

        let request = self.build_request(audio, format);
        info!(
            raw_bytes = request.data_len,
            encoded_bytes = request.data.len(),
            engine = %request.engine_model_type,
            "Submitting recognition task"
        );

        let response = self.api.create_rec_task(&request).await?;
        match response.data {
            Some(data) => {
                info!(task_id = data.task_id, "Recognition task created");
                Ok(data.task_id)
            }
            None => Err(AsrError::remote(
                "MissingTaskId",
                "response did not include a task id",
            )),
        }
    }
}
