//! Status command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, TranscriptionReport};
use crate::transcription::TaskStatus;
use anyhow::Result;

/// Run the status command: one lookup, no polling, no resubmission.
pub async fn run_status(task_id: u64, json: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Status, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(&settings)?;

    let snapshot = match orchestrator.task_status(task_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            if json {
                let report = TranscriptionReport::from_error(&e, true);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                Output::error(&format!("[{}] {}", e.kind(), e.public_message()));
            }
            return Err(e.into());
        }
    };

    if json {
        let report = TranscriptionReport::from_snapshot(&snapshot);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Output::header(&format!("Task {}", snapshot.task_id));
    Output::kv("Status", &format!("{:?} ({})", snapshot.status, snapshot.status_str));
    if let Some(duration) = snapshot.audio_duration {
        Output::kv("Audio", &format!("{:.1}s", duration));
    }

    match snapshot.status {
        TaskStatus::Succeeded => {
            let raw = snapshot.result_text.as_deref().unwrap_or_default();
            let text = crate::transcription::normalize::clean(raw);
            Output::transcript("Result", Some(snapshot.task_id), &text);
        }
        TaskStatus::Failed => {
            Output::error(snapshot.error_message.as_deref().unwrap_or("recognition failed"));
        }
        TaskStatus::Pending | TaskStatus::Running => {
            Output::info("Task is still in progress. Check again later.");
        }
    }

    Ok(())
}
