//! Error types module
//!
//! `PublishError` is the single error type of the publishing pipeline. Every
//! variant maps onto a flat [`FailureKind`], which is what callers of the
//! pipeline observe in an [`UploadResult::Failure`](crate::UploadResult).
//!
//! Transient upload conditions (an empty asset token, a dropped connection before
//! the last attempt) are deliberately absent: the upload retry loop models them as
//! values and only surfaces `UploadExhausted` once the budget is spent.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::models::PublishStage;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Warning level - for rejected input (file not ready, failed validation)
    Warn,
    /// Error level - for remote and unexpected failures
    Error,
}

/// Terminal failure classification returned to the caller of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotReady,
    ValidationFailed,
    UploadExhausted,
    RemoteRejected,
    Unexpected,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailureKind::NotReady => write!(f, "not_ready"),
            FailureKind::ValidationFailed => write!(f, "validation_failed"),
            FailureKind::UploadExhausted => write!(f, "upload_exhausted"),
            FailureKind::RemoteRejected => write!(f, "remote_rejected"),
            FailureKind::Unexpected => write!(f, "unexpected"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("File {path} not ready after {attempts} attempts")]
    NotReady { path: String, attempts: u32 },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Upload failed after {attempts} attempts: {last_error}")]
    UploadExhausted { attempts: u32, last_error: String },

    #[error("Remote API rejected {stage} (code {code}): {message}")]
    RemoteRejected {
        stage: PublishStage,
        code: i64,
        message: String,
    },

    #[error("Malformed {stage} response: {detail}")]
    MalformedResponse { stage: PublishStage, detail: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Result type for pipeline operations
pub type PublishResult<T> = Result<T, PublishError>;

impl PublishError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PublishError::NotReady { .. } => FailureKind::NotReady,
            PublishError::ValidationFailed(_) => FailureKind::ValidationFailed,
            PublishError::UploadExhausted { .. } => FailureKind::UploadExhausted,
            PublishError::RemoteRejected { .. } | PublishError::MalformedResponse { .. } => {
                FailureKind::RemoteRejected
            }
            PublishError::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    /// Whether the pipeline stopped before any remote call was made
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PublishError::NotReady { .. } | PublishError::ValidationFailed(_)
        )
    }

    pub fn log_level(&self) -> LogLevel {
        if self.is_local() {
            LogLevel::Warn
        } else {
            LogLevel::Error
        }
    }
}

impl From<std::io::Error> for PublishError {
    fn from(err: std::io::Error) -> Self {
        PublishError::Unexpected(format!("IO error: {}", err))
    }
}
