//! HTTP API server for the upload route used by the learning platform.
//!
//! Accepts multipart audio uploads and answers with the same caller-facing
//! report the CLI prints with `--json`.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::{AsrError, ErrorKind};
use crate::orchestrator::{Orchestrator, TranscribeOptions, TranscriptionReport};
use crate::transcription::{AudioFormat, TranscriptionMode};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub settings: Settings,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload = state.settings.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/audio/transcribe", post(transcribe))
        .route("/api/audio/tasks/{task_id}", get(task_status))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'feyn-asr doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(&settings)?;
    let state = Arc::new(AppState {
        orchestrator,
        settings,
    });
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("feyn-asr API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Transcribe", "POST /api/audio/transcribe");
    Output::kv("Task status", "GET  /api/audio/tasks/:task_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// HTTP status for a failed request.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::Exhausted | ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::RemoteRejected | ErrorKind::QueryFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::SigningError | ErrorKind::ConfigError | ErrorKind::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &AsrError, diagnostics: bool) -> axum::response::Response {
    let report = TranscriptionReport::from_error(err, diagnostics);
    (status_for(err.kind()), Json(report)).into_response()
}

/// Fields collected from one multipart upload.
#[derive(Debug, Default)]
struct Upload {
    audio: Vec<u8>,
    file_name: Option<String>,
    mode: TranscriptionMode,
    format: Option<String>,
    sample_rate: Option<u32>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AsrError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AsrError::Validation(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.audio = field
                    .bytes()
                    .await
                    .map_err(|e| AsrError::Validation(format!("Malformed upload: {}", e)))?
                    .to_vec();
            }
            "mode" | "format" | "sample_rate" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AsrError::Validation(format!("Malformed upload: {}", e)))?;
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "mode" => upload.mode = value.parse().map_err(AsrError::Validation)?,
                    "format" => upload.format = Some(value.to_lowercase()),
                    _ => {
                        upload.sample_rate = Some(value.parse().map_err(|_| {
                            AsrError::Validation(format!("Invalid sample_rate: {}", value))
                        })?)
                    }
                }
            }
            _ => {}
        }
    }

    Ok(upload)
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn transcribe(State(state): State<Arc<AppState>>, multipart: Multipart) -> impl IntoResponse {
    let diagnostics = state.settings.server.diagnostics;

    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return error_response(&e, diagnostics),
    };
    if upload.audio.is_empty() {
        return error_response(
            &AsrError::Validation("No audio file uploaded".to_string()),
            diagnostics,
        );
    }

    let defaults = &state.settings.transcription;
    let voice_format = upload
        .format
        .or_else(|| upload.file_name.as_deref().and_then(AudioFormat::voice_format_from_name))
        .unwrap_or_else(|| defaults.voice_format.clone());
    let format = AudioFormat::new(voice_format, upload.sample_rate.unwrap_or(defaults.sample_rate));

    info!(
        bytes = upload.audio.len(),
        file = upload.file_name.as_deref().unwrap_or("-"),
        mode = %upload.mode,
        "Received audio upload"
    );

    let options = TranscribeOptions {
        mode: upload.mode,
        format: Some(format),
    };
    match state.orchestrator.transcribe(&upload.audio, &options).await {
        Ok(output) => Json(TranscriptionReport::from_output(&output)).into_response(),
        Err(e) => {
            warn!(kind = %e.kind(), "Upload transcription failed");
            error_response(&e, diagnostics)
        }
    }
}

/// Single lookup. Answers 200 for any task the provider knows, with a
/// `Success`, `Failure` or `InProgress` report body.
async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<u64>,
) -> impl IntoResponse {
    match state.orchestrator.task_status(task_id).await {
        Ok(snapshot) => Json(TranscriptionReport::from_snapshot(&snapshot)).into_response(),
        Err(e) => error_response(&e, state.settings.server.diagnostics),
    }
}
