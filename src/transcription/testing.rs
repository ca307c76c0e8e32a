//! Scripted [`AsrApi`] used by unit tests.

use super::messages::{
    CreateRecTaskRequest, CreateRecTaskResponse, DescribeTaskStatusResponse,
    SentenceRecognitionRequest, SentenceRecognitionResponse, TaskIdData, TaskStatusData,
};
use super::AsrApi;
use crate::error::{AsrError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Status body with the given code and result.
pub fn status(
    task_id: u64,
    code: i64,
    result: Option<&str>,
    error_msg: Option<&str>,
) -> TaskStatusData {
    TaskStatusData {
        task_id,
        status: code,
        status_str: match code {
            0 => "waiting",
            1 => "doing",
            2 => "success",
            3 => "failed",
            _ => "unknown",
        }
        .to_string(),
        result: result.map(str::to_string),
        error_msg: error_msg.map(str::to_string),
        audio_duration: None,
    }
}

/// A transport failure the poller treats as transient.
pub fn transport_error() -> AsrError {
    AsrError::Timeout("operation timed out".to_string())
}

pub struct ScriptedApi {
    task_id: Option<u64>,
    submit_error: Mutex<Option<AsrError>>,
    statuses: Mutex<VecDeque<Result<TaskStatusData>>>,
    sentence: Mutex<Option<Result<SentenceRecognitionResponse>>>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    sentence_calls: AtomicUsize,
    last_submit: Mutex<Option<CreateRecTaskRequest>>,
    last_sentence: Mutex<Option<SentenceRecognitionRequest>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            task_id: Some(1),
            submit_error: Mutex::new(None),
            statuses: Mutex::new(VecDeque::new()),
            sentence: Mutex::new(None),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            sentence_calls: AtomicUsize::new(0),
            last_submit: Mutex::new(None),
            last_sentence: Mutex::new(None),
        }
    }
}

impl ScriptedApi {
    pub fn with_task_id(mut self, task_id: Option<u64>) -> Self {
        self.task_id = task_id;
        self
    }

    pub fn with_submit_error(self, err: AsrError) -> Self {
        *self.submit_error.lock().unwrap() = Some(err);
        self
    }

    /// Responses returned by successive status queries.
    /// Once drained, every query reports "running".
    pub fn with_statuses(self, statuses: Vec<Result<TaskStatusData>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_sentence(self, result: Result<SentenceRecognitionResponse>) -> Self {
        *self.sentence.lock().unwrap() = Some(result);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn sentence_calls(&self) -> usize {
        self.sentence_calls.load(Ordering::SeqCst)
    }

    pub fn last_submit(&self) -> Option<CreateRecTaskRequest> {
        self.last_submit.lock().unwrap().clone()
    }

    pub fn last_sentence(&self) -> Option<SentenceRecognitionRequest> {
        self.last_sentence.lock().unwrap().clone()
    }
}

#[async_trait]
impl AsrApi for ScriptedApi {
    async fn create_rec_task(
        &self,
        request: &CreateRecTaskRequest,
    ) -> Result<CreateRecTaskResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_submit.lock().unwrap() = Some(request.clone());
        if let Some(err) = self.submit_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(CreateRecTaskResponse {
            data: self.task_id.map(|task_id| TaskIdData { task_id }),
            request_id: Some("scripted".to_string()),
        })
    }

    async fn describe_task_status(&self, task_id: u64) -> Result<DescribeTaskStatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(status(task_id, 1, None, None)));
        next.map(|data| DescribeTaskStatusResponse {
            data: Some(data),
            request_id: Some("scripted".to_string()),
        })
    }

    async fn sentence_recognition(
        &self,
        request: &SentenceRecognitionRequest,
    ) -> Result<SentenceRecognitionResponse> {
        self.sentence_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sentence.lock().unwrap() = Some(request.clone());
        self.sentence.lock().unwrap().take().unwrap_or_else(|| {
            Ok(SentenceRecognitionResponse {
                result: "scripted sentence".to_string(),
                audio_duration: Some(1000),
                request_id: Some("scripted".to_string()),
            })
        })
    }
}
