use photowall_core::constants::{ACK_FAILED, ACK_FILE_NOT_READY, ACK_PUBLISHED, ACK_SHUTTING_DOWN};
use photowall_core::{FailureKind, UploadResult};
use serde::Serialize;

/// Reply handed back to whoever submitted the photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Acknowledgment {
    Published { post_id: i64 },
    Failed { kind: FailureKind },
    FileNotReady,
    ShuttingDown,
}

impl Acknowledgment {
    /// Human-readable text for the chat reply
    pub fn message(&self) -> String {
        match self {
            Acknowledgment::Published { post_id } => {
                ACK_PUBLISHED.replace("{post_id}", &post_id.to_string())
            }
            Acknowledgment::Failed { .. } => ACK_FAILED.to_string(),
            Acknowledgment::FileNotReady => ACK_FILE_NOT_READY.to_string(),
            Acknowledgment::ShuttingDown => ACK_SHUTTING_DOWN.to_string(),
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Acknowledgment::Published { .. })
    }
}

impl From<UploadResult> for Acknowledgment {
    fn from(result: UploadResult) -> Self {
        match result {
            UploadResult::Success { post_id } => Acknowledgment::Published { post_id },
            UploadResult::Failure {
                kind: FailureKind::NotReady,
            } => Acknowledgment::FileNotReady,
            UploadResult::Failure { kind } => Acknowledgment::Failed { kind },
        }
    }
}
