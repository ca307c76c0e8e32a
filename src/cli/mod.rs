//! CLI module for feyn-asr.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// feyn-asr - Remote speech transcription for the Feynman learning platform
///
/// Sends recorded explanations to Tencent Cloud ASR and returns clean text.
#[derive(Parser, Debug)]
#[command(name = "feyn-asr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe one or more audio files
    Transcribe {
        /// Audio files to transcribe
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Use the single-request path (files up to 5 MiB, no task polling)
        #[arg(long)]
        sync: bool,

        /// Audio format (wav, mp3, m4a, ...). Defaults to the file extension.
        #[arg(long)]
        format: Option<String>,

        /// Sample rate hint in Hz
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Print the provider text including timing annotations
        #[arg(long)]
        raw: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up the status of a previously submitted task
    Status {
        /// Task id returned by an earlier transcription
        task_id: u64,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP transcription server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration (secrets masked)
    Show,

    /// Write a default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}
