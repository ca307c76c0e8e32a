//! Error types for feyn-asr.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-facing classification of a failed transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    SigningError,
    RemoteRejected,
    Timeout,
    Exhausted,
    QueryFailed,
    Cancelled,
    ConfigError,
    InternalError,
}

impl ErrorKind {
    /// Whether the failure may resolve itself if the caller simply tries again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::Exhausted | ErrorKind::QueryFailed
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::SigningError => "SigningError",
            ErrorKind::RemoteRejected => "RemoteRejected",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Exhausted => "Exhausted",
            ErrorKind::QueryFailed => "QueryFailed",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::ConfigError => "ConfigError",
            ErrorKind::InternalError => "InternalError",
        };
        f.write_str(name)
    }
}

/// Library-level error type for transcription operations.
#[derive(Error, Debug)]
pub enum AsrError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Remote service rejected the request: {message} (code: {code})")]
    RemoteRejected { code: String, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transcription did not finish after {attempts} status checks, try again later")]
    Exhausted { attempts: u32 },

    #[error("Status query failed: {0}")]
    QueryFailed(String),

    /// A non-success HTTP status without a provider envelope, e.g. a gateway error page.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transcription failed: {message}")]
    TranscriptionFailed { kind: ErrorKind, message: String },

    #[error("Transcription cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AsrError {
    /// Build a `RemoteRejected` error from a provider code and message.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        AsrError::RemoteRejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Classify a reqwest failure, splitting timeouts from other transport errors.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AsrError::Timeout(err.without_url().to_string())
        } else {
            AsrError::Http(err.without_url())
        }
    }

    /// Project the error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AsrError::Validation(_) => ErrorKind::ValidationError,
            AsrError::Signing(_) => ErrorKind::SigningError,
            AsrError::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            AsrError::Timeout(_) => ErrorKind::Timeout,
            AsrError::Exhausted { .. } => ErrorKind::Exhausted,
            AsrError::QueryFailed(_) | AsrError::Transport(_) | AsrError::Http(_) => {
                ErrorKind::QueryFailed
            }
            AsrError::TranscriptionFailed { kind, .. } => *kind,
            AsrError::Cancelled => ErrorKind::Cancelled,
            AsrError::Config(_) | AsrError::TomlParse(_) => ErrorKind::ConfigError,
            AsrError::Io(_) | AsrError::Json(_) => ErrorKind::InternalError,
        }
    }

    /// Transport-level failures that the poller may absorb before its final attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AsrError::Timeout(_) | AsrError::Transport(_) | AsrError::Http(_)
        )
    }

    /// Message safe to return to callers outside diagnostic flows.
    pub fn public_message(&self) -> String {
        match self {
            AsrError::RemoteRejected { message, .. } => message.clone(),
            AsrError::TranscriptionFailed { message, .. } => message.clone(),
            AsrError::Io(_) | AsrError::Json(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for feyn-asr operations.
pub type Result<T> = std::result::Result<T, AsrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AsrError::Validation("too big".into()).kind(),
            ErrorKind::ValidationError
        );
        assert_eq!(AsrError::remote("X", "nope").kind(), ErrorKind::RemoteRejected);
        assert_eq!(
            AsrError::Exhausted { attempts: 60 }.kind(),
            ErrorKind::Exhausted
        );
        assert_eq!(
            AsrError::TranscriptionFailed {
                kind: ErrorKind::QueryFailed,
                message: "boom".into(),
            }
            .kind(),
            ErrorKind::QueryFailed
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Exhausted.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::ValidationError.is_retryable());
        assert!(!ErrorKind::SigningError.is_retryable());
    }

    #[test]
    fn test_gateway_error_is_transient_query_failure() {
        let err = AsrError::Transport("HTTP 502 Bad Gateway".into());
        assert!(err.is_transient());
        assert_eq!(err.kind(), ErrorKind::QueryFailed);
        assert!(!AsrError::remote("InvalidResponse", "garbled").is_transient());
    }

    #[test]
    fn test_public_message_keeps_provider_text() {
        let err = AsrError::remote("FailedOperation.NoSuchTask", "task not found");
        assert_eq!(err.public_message(), "task not found");
    }
}
