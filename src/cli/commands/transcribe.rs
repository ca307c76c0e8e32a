//! Transcribe command implementation.

use crate::cli::output::format_size;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, TranscribeOptions, TranscriptionReport};
use crate::transcription::{AudioFormat, TranscriptionMode};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Flags shared by every file in one invocation.
#[derive(Debug, Clone)]
pub struct TranscribeArgs {
    pub sync: bool,
    pub format: Option<String>,
    pub sample_rate: Option<u32>,
    pub raw: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct FileReport {
    file: String,
    #[serde(flatten)]
    report: TranscriptionReport,
}

/// Run the transcribe command.
pub async fn run_transcribe(
    inputs: &[String],
    args: TranscribeArgs,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcribe, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'feyn-asr doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Arc::new(Orchestrator::new(&settings)?);
    let cancel = CancellationToken::new();

    // Ctrl+C stops waiting; submitted tasks keep running remotely.
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mode = if args.sync {
        TranscriptionMode::Sync
    } else {
        TranscriptionMode::Async
    };

    if !args.json {
        let policy = orchestrator.poll_policy();
        Output::info(&format!(
            "Transcribing {} file(s) ({} mode, up to {} status checks every {:?})",
            inputs.len(),
            mode,
            policy.max_attempts,
            policy.interval
        ));
    }

    let progress = (!args.json && inputs.len() > 1)
        .then(|| Output::progress_bar(inputs.len() as u64, "transcribing"));
    let spinner = (!args.json && inputs.len() == 1).then(|| Output::spinner("Transcribing..."));

    let concurrency = settings.transcription.max_concurrent.max(1);
    let results: Vec<(String, TranscriptionReport)> = stream::iter(inputs.iter().cloned())
        .map(|input| {
            let orchestrator = orchestrator.clone();
            let cancel = cancel.clone();
            let settings = &settings;
            let args = &args;
            let progress = progress.clone();
            async move {
                let report =
                    transcribe_file(&orchestrator, &input, mode, args, settings, &cancel).await;
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                (input, report)
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    let failures = results.iter().filter(|(_, r)| !r.is_success()).count();

    if args.json {
        let reports: Vec<FileReport> = results
            .into_iter()
            .map(|(file, report)| FileReport { file, report })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (file, report) in &results {
            print_report(file, report, args.raw);
        }
        println!();
        if failures == 0 {
            Output::success(&format!("{} file(s) transcribed", results.len()));
        }
    }

    if failures > 0 {
        if !args.json {
            Output::error(&format!("{} of {} file(s) failed", failures, inputs.len()));
        }
        return Err(anyhow::anyhow!("{} transcription(s) failed", failures));
    }

    Ok(())
}

/// Read one file and run it through the orchestrator.
async fn transcribe_file(
    orchestrator: &Orchestrator,
    input: &str,
    mode: TranscriptionMode,
    args: &TranscribeArgs,
    settings: &Settings,
    cancel: &CancellationToken,
) -> TranscriptionReport {
    let path = Settings::expand_path(input);
    let audio = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return TranscriptionReport::from_error(
                &crate::error::AsrError::Validation(format!("Cannot read {}: {}", input, e)),
                false,
            );
        }
    };

    let defaults = &settings.transcription;
    let voice_format = args
        .format
        .clone()
        .or_else(|| AudioFormat::voice_format_from_name(input))
        .unwrap_or_else(|| defaults.voice_format.clone());
    let format = AudioFormat::new(voice_format, args.sample_rate.unwrap_or(defaults.sample_rate));

    tracing::info!(
        file = %input,
        size = %format_size(audio.len() as u64),
        format = %format.voice_format,
        "Read audio"
    );

    let options = TranscribeOptions {
        mode,
        format: Some(format),
    };
    let result = orchestrator
        .transcribe_with_cancel(&audio, &options, cancel)
        .await;
    TranscriptionReport::from_result(&result, false)
}

fn print_report(file: &str, report: &TranscriptionReport, raw: bool) {
    match report {
        TranscriptionReport::Success {
            text,
            raw_text,
            task_id,
            ..
        } => {
            let shown = if raw { raw_text } else { text };
            Output::transcript(file, *task_id, shown);
        }
        TranscriptionReport::Failure {
            error_kind, message, ..
        } => {
            Output::error(&format!("{}: [{}] {}", file, error_kind, message));
            if error_kind.is_retryable() {
                Output::info("The service may still be busy; try again later.");
            }
        }
        TranscriptionReport::InProgress { task_id, status, .. } => {
            Output::warning(&format!("{}: task {} is still {}", file, task_id, status));
        }
    }
}
