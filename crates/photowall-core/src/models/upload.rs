use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use crate::error::FailureKind;

/// A photo waiting to be published.
///
/// The caller owns `path` exclusively until the pipeline returns. The file is
/// deleted after a successful publish and left in place on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    pub path: PathBuf,
    #[serde(default)]
    pub caption: String,
}

impl UploadTask {
    pub fn new(path: impl Into<PathBuf>, caption: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caption: caption.into(),
        }
    }
}

/// Outcome of one publish, returned exactly once per task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResult {
    Success { post_id: i64 },
    Failure { kind: FailureKind },
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Success { .. })
    }

    pub fn post_id(&self) -> Option<i64> {
        match self {
            UploadResult::Success { post_id } => Some(*post_id),
            UploadResult::Failure { .. } => None,
        }
    }
}

/// Uploaded-but-unsaved photo, produced by the upload step and consumed by the save step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAssetRef {
    pub server: i64,
    pub photo: String,
    pub hash: String,
}

/// Stages of the remote publish state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStage {
    Idle,
    GetTarget,
    Uploading,
    Saving,
    Posting,
    Done,
    Failed,
}

impl Display for PublishStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PublishStage::Idle => write!(f, "idle"),
            PublishStage::GetTarget => write!(f, "get_target"),
            PublishStage::Uploading => write!(f, "uploading"),
            PublishStage::Saving => write!(f, "saving"),
            PublishStage::Posting => write!(f, "posting"),
            PublishStage::Done => write!(f, "done"),
            PublishStage::Failed => write!(f, "failed"),
        }
    }
}
