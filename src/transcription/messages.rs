//! Wire types for the Tencent Cloud ASR API (version 2019-06-14).

use super::models::{TaskSnapshot, TaskStatus};
use crate::error::{AsrError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const ACTION_CREATE_REC_TASK: &str = "CreateRecTask";
pub const ACTION_DESCRIBE_TASK_STATUS: &str = "DescribeTaskStatus";
pub const ACTION_SENTENCE_RECOGNITION: &str = "SentenceRecognition";

/// `SourceType` value for audio carried inline in `Data`.
pub const SOURCE_TYPE_INLINE: u32 = 1;

// =============================================================================
// Requests
// =============================================================================

/// Body of `CreateRecTask`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRecTaskRequest {
    pub engine_model_type: String,
    pub channel_num: u32,
    pub res_text_format: u32,
    pub source_type: u32,
    /// Base64 audio.
    pub data: String,
    /// Length of the audio before base64 encoding.
    pub data_len: usize,
}

/// Body of `DescribeTaskStatus`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTaskStatusRequest {
    pub task_id: u64,
}

/// Body of `SentenceRecognition`.
#[derive(Debug, Clone, Serialize)]
pub struct SentenceRecognitionRequest {
    #[serde(rename = "EngSerViceType")]
    pub eng_service_type: String,
    #[serde(rename = "SourceType")]
    pub source_type: u32,
    #[serde(rename = "VoiceFormat")]
    pub voice_format: String,
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "DataLen")]
    pub data_len: usize,
}

// =============================================================================
// Responses
// =============================================================================

/// Error object the provider embeds in a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskIdData {
    #[serde(rename = "TaskId")]
    pub task_id: u64,
}

/// `Response` of `CreateRecTask`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecTaskResponse {
    #[serde(rename = "Data", default)]
    pub data: Option<TaskIdData>,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusData {
    #[serde(rename = "TaskId", default)]
    pub task_id: u64,
    #[serde(rename = "Status", default)]
    pub status: i64,
    #[serde(rename = "StatusStr", default)]
    pub status_str: String,
    #[serde(rename = "Result", default)]
    pub result: Option<String>,
    #[serde(rename = "ErrorMsg", default)]
    pub error_msg: Option<String>,
    #[serde(rename = "AudioDuration", default)]
    pub audio_duration: Option<f64>,
}

impl From<TaskStatusData> for TaskSnapshot {
    fn from(data: TaskStatusData) -> Self {
        let status = TaskStatus::from_code(data.status);
        Self {
            task_id: data.task_id,
            status,
            status_code: data.status,
            status_str: data.status_str,
            result_text: data.result,
            error_message: data.error_msg.filter(|m| !m.is_empty()),
            audio_duration: data.audio_duration,
        }
    }
}

/// `Response` of `DescribeTaskStatus`.
#[derive(Debug, Clone, Deserialize)]
pub struct DescribeTaskStatusResponse {
    #[serde(rename = "Data", default)]
    pub data: Option<TaskStatusData>,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
}

/// `Response` of `SentenceRecognition`.
#[derive(Debug, Clone, Deserialize)]
pub struct SentenceRecognitionResponse {
    #[serde(rename = "Result", default)]
    pub result: String,
    /// Milliseconds.
    #[serde(rename = "AudioDuration", default)]
    pub audio_duration: Option<i64>,
    #[serde(rename = "RequestId", default)]
    pub request_id: Option<String>,
}

/// Whether `body` is JSON carrying a `Response` object.
pub fn has_envelope(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|value| value.get("Response").is_some_and(|r| r.is_object()))
        .unwrap_or(false)
}

/// Unwrap the `{"Response": {...}}` envelope, turning an embedded `Error` into `RemoteRejected`.
pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|_| AsrError::remote("InvalidResponse", "response body is not valid JSON"))?;

    let response = value
        .get("Response")
        .cloned()
        .ok_or_else(|| AsrError::remote("InvalidResponse", "response envelope is missing"))?;

    if let Some(err) = response.get("Error") {
        let err: ApiError = serde_json::from_value(err.clone()).map_err(|_| {
            AsrError::remote("InvalidResponse", "response error object is malformed")
        })?;
        return Err(AsrError::RemoteRejected {
            code: err.code,
            message: err.message,
        });
    }

    serde_json::from_value(response).map_err(|e| {
        AsrError::remote("InvalidResponse", format!("unexpected response shape: {}", e))
    })
}
