//! Pre-flight checks before network operations.
//!
//! Validates that credentials are available before starting work that
//! would otherwise fail on the first signed request.

use crate::config::Settings;
use crate::error::Result;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Transcription signs requests.
    Transcribe,
    /// Status lookups sign requests.
    Status,
    /// The server transcribes on behalf of callers.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Transcribe | Operation::Status | Operation::Serve => {
            settings.credential()?;
        }
    }
    Ok(())
}
