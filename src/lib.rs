//! feyn-asr - Remote transcription for the Feynman learning platform
//!
//! Turns recorded audio into clean text by delegating recognition to
//! Tencent Cloud ASR.
//!
//! # Overview
//!
//! feyn-asr can:
//! - Sign requests with TC3-HMAC-SHA256
//! - Submit recognition tasks and poll them to completion
//! - Recognize short clips in a single request
//! - Strip the provider's timing annotations from transcripts
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `signing` - Request signing
//! - `transcription` - Provider client, submitter, poller and sync path
//! - `orchestrator` - Chooses a path and produces the caller-facing result
//! - `cli` - Command line and HTTP surfaces
//!
//! # Example
//!
//! ```rust,no_run
//! use feyn_asr::config::Settings;
//! use feyn_asr::orchestrator::{Orchestrator, TranscribeOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let audio = std::fs::read("explanation.wav")?;
//!     let output = orchestrator
//!         .transcribe(&audio, &TranscribeOptions::default())
//!         .await?;
//!     println!("{}", output.cleaned_text);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod signing;
pub mod transcription;

pub use error::{AsrError, ErrorKind, Result};
