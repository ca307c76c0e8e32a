//! feyn-asr CLI entry point.

use anyhow::Result;
use clap::Parser;
use feyn_asr::cli::commands::{self, TranscribeArgs};
use feyn_asr::cli::{Cli, Commands};
use feyn_asr::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("feyn_asr={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Transcribe {
            inputs,
            sync,
            format,
            sample_rate,
            raw,
            json,
        } => {
            let args = TranscribeArgs {
                sync: *sync,
                format: format.clone(),
                sample_rate: *sample_rate,
                raw: *raw,
                json: *json,
            };
            commands::run_transcribe(inputs, args, settings).await?;
        }

        Commands::Status { task_id, json } => {
            commands::run_status(*task_id, *json, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
