//! CLI command implementations.

mod config;
mod doctor;
mod serve;
mod status;
mod transcribe;

pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::{router, run_serve, AppState};
pub use status::run_status;
pub use transcribe::{run_transcribe, TranscribeArgs};
