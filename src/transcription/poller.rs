//! Status polling for asynchronous recognition tasks.
//!
//! The loop in [`poll_with`] only sleeps, queries and stops; every decision
//! about what a query result means lives in [`advance`], so the attempt
//! budget can be tested without a network or a clock.

use super::models::{TaskSnapshot, TaskStatus};
use super::AsrApi;
use crate::config::TranscriptionSettings;
use crate::error::{AsrError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default number of status queries before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Default pause between status queries.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Attempt budget and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl From<&TranscriptionSettings> for PollPolicy {
    fn from(settings: &TranscriptionSettings) -> Self {
        Self {
            max_attempts: settings.max_poll_attempts.max(1),
            interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }
}

/// Where a task stands from the poller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Pending,
    Running,
    /// Remote status 2.
    Succeeded {
        text: String,
        audio_duration: Option<f64>,
    },
    /// Remote status 3.
    Failed { message: String },
    /// Budget spent without a terminal remote status.
    Exhausted { attempts: u32 },
    /// Transport error on the final allotted attempt.
    QueryFailed { error: String },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Pending | PollState::Running)
    }

    /// Short label for logs and status output.
    pub fn label(&self) -> &'static str {
        match self {
            PollState::Pending => "pending",
            PollState::Running => "running",
            PollState::Succeeded { .. } => "succeeded",
            PollState::Failed { .. } => "failed",
            PollState::Exhausted { .. } => "exhausted",
            PollState::QueryFailed { .. } => "query_failed",
        }
    }

    /// The error a terminal failure state stands for; `None` for every other state.
    pub fn failure(&self) -> Option<AsrError> {
        match self {
            PollState::Failed { message } => Some(AsrError::remote("TaskFailed", message.clone())),
            PollState::Exhausted { attempts } => Some(AsrError::Exhausted {
                attempts: *attempts,
            }),
            PollState::QueryFailed { error } => Some(AsrError::QueryFailed(error.clone())),
            _ => None,
        }
    }
}

/// Result of one status query, reduced to what [`advance`] needs.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Status(TaskSnapshot),
    TransportError(String),
}

/// Compute the next state after `attempt` (1-based) of `policy.max_attempts`.
pub fn advance(
    current: PollState,
    attempt: u32,
    policy: &PollPolicy,
    outcome: QueryOutcome,
) -> PollState {
    if current.is_terminal() {
        return current;
    }
    let last_attempt = attempt >= policy.max_attempts;

    match outcome {
        QueryOutcome::Status(snapshot) => match snapshot.status {
            TaskStatus::Succeeded => PollState::Succeeded {
                text: snapshot.result_text.unwrap_or_default(),
                audio_duration: snapshot.audio_duration,
            },
            TaskStatus::Failed => PollState::Failed {
                message: snapshot
                    .error_message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("recognition failed ({})", snapshot.status_str)),
            },
            _ if last_attempt => PollState::Exhausted { attempts: attempt },
            TaskStatus::Pending => PollState::Pending,
            TaskStatus::Running => PollState::Running,
        },
        QueryOutcome::TransportError(error) if last_attempt => PollState::QueryFailed { error },
        QueryOutcome::TransportError(_) => current,
    }
}

/// Terminal state together with the number of queries it took.
#[derive(Debug, Clone, PartialEq)]
pub struct PollOutcome {
    pub task_id: u64,
    pub state: PollState,
    pub attempts: u32,
}

/// Poll `task_id` with `query` until a terminal state.
///
/// Transport errors are absorbed until the last attempt. Any other error
/// (a signing failure, a provider rejection) ends polling immediately.
/// Cancelling `cancel` abandons the wait; the remote task keeps running.
pub async fn poll_with<F, Fut>(
    task_id: u64,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut query: F,
) -> Result<PollOutcome>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<TaskSnapshot>>,
{
    let mut state = PollState::Pending;
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            tokio::select! {
                _ = cancel.cancelled() => return Err(AsrError::Cancelled),
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(AsrError::Cancelled),
            result = query(task_id) => result,
        };

        let outcome = match result {
            Ok(snapshot) => QueryOutcome::Status(snapshot),
            Err(e) if e.is_transient() => {
                warn!(task_id, attempt, error = %e, "Status query failed");
                QueryOutcome::TransportError(e.to_string())
            }
            Err(e) => return Err(e),
        };

        state = advance(state, attempt, policy, outcome);
        debug!(task_id, attempt, state = state.label(), "Polled task");

        if state.is_terminal() {
            return Ok(PollOutcome {
                task_id,
                state,
                attempts: attempt,
            });
        }
    }

    // Only reachable if `advance` left a non-terminal state on the last attempt.
    Ok(PollOutcome {
        task_id,
        state: PollState::Exhausted {
            attempts: max_attempts,
        },
        attempts: max_attempts,
    })
}

/// Polls tasks through an [`AsrApi`].
pub struct TaskPoller {
    api: Arc<dyn AsrApi>,
    policy: PollPolicy,
}

impl TaskPoller {
    pub fn new(api: Arc<dyn AsrApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// One status query, without any retry.
    #[instrument(skip(self))]
    pub async fn status(&self, task_id: u64) -> Result<TaskSnapshot> {
        let response = self.api.describe_task_status(task_id).await?;
        response
            .data
            .map(TaskSnapshot::from)
            .ok_or_else(|| {
                AsrError::remote("MissingData", "status response did not include task data")
            })
    }

    /// Poll until the task is terminal, the budget is spent, or `cancel` fires.
    #[instrument(skip(self, cancel))]
    pub async fn poll(&self, task_id: u64, cancel: &CancellationToken) -> Result<PollOutcome> {
        let outcome = poll_with(task_id, &self.policy, cancel, |id| self.status(id)).await;
        match &outcome {
            Ok(o) => info!(
                task_id,
                attempts = o.attempts,
                state = o.state.label(),
                "Polling finished"
            ),
            Err(AsrError::Cancelled) => {
                warn!(task_id, "Polling cancelled, remote task left running")
            }
            Err(e) => warn!(task_id, error = %e, "Polling aborted"),
        }
        outcome
    }
}
