//! Remote transcription against Tencent Cloud ASR.
//!
//! # Paths
//!
//! - **Asynchronous** (default): [`TaskSubmitter`] creates a recognition task,
//!   [`TaskPoller`] queries its status until it is terminal or the attempt
//!   budget runs out.
//! - **Synchronous**: [`SyncTranscriber`] sends one size-bounded request and
//!   reads the text straight from the response.
//!
//! Both paths sign every call with the same [`crate::signing`] functions, and
//! both pass their text through [`normalize::clean`].

mod client;
mod messages;
mod models;
pub mod normalize;
mod poller;
mod submitter;
mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientOptions, TencentAsrClient};
pub use messages::{
    ApiError, CreateRecTaskRequest, CreateRecTaskResponse, DescribeTaskStatusRequest,
    DescribeTaskStatusResponse, SentenceRecognitionRequest, SentenceRecognitionResponse,
    TaskIdData, TaskStatusData, ACTION_CREATE_REC_TASK, ACTION_DESCRIBE_TASK_STATUS,
    ACTION_SENTENCE_RECOGNITION, SOURCE_TYPE_INLINE,
};
pub use models::{
    AudioFormat, TaskSnapshot, TaskStatus, TranscriptOutput, TranscriptionMode, TranscriptionTask,
};
pub use poller::{advance, poll_with, PollOutcome, PollPolicy, PollState, QueryOutcome, TaskPoller};
pub use submitter::{SubmitOptions, TaskSubmitter};
pub use sync::{SyncTranscriber, SYNC_MAX_BYTES};

use crate::error::Result;
use async_trait::async_trait;

/// The provider actions the subsystem depends on.
///
/// Implemented by [`TencentAsrClient`]; tests substitute scripted fakes.
#[async_trait]
pub trait AsrApi: Send + Sync {
    /// Create an asynchronous recognition task.
    async fn create_rec_task(
        &self,
        request: &CreateRecTaskRequest,
    ) -> Result<CreateRecTaskResponse>;

    /// Query the status of a previously created task.
    async fn describe_task_status(&self, task_id: u64) -> Result<DescribeTaskStatusResponse>;

    /// Recognize a short clip in a single round trip.
    async fn sentence_recognition(
        &self,
        request: &SentenceRecognitionRequest,
    ) -> Result<SentenceRecognitionResponse>;
}
