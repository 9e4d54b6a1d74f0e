//! Wire types of the wall API
//!
//! Method calls answer either `{"response": ...}` or
//! `{"error": {"error_code": .., "error_msg": ..}}`. The upload server answers
//! a flat `{server, photo, hash}` object instead.

use photowall_core::{PublishError, PublishResult, PublishStage, RemoteAssetRef};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default = "unknown_error")]
    pub error_msg: String,
}

fn unknown_error() -> String {
    "Unknown error".to_string()
}

/// Envelope of every method call
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub response: Option<T>,
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiEnvelope<T> {
    /// An `error` member wins over `response`; neither is malformed
    pub fn into_result(self, stage: PublishStage) -> PublishResult<T> {
        if let Some(error) = self.error {
            return Err(PublishError::RemoteRejected {
                stage,
                code: error.error_code,
                message: error.error_msg,
            });
        }

        self.response.ok_or_else(|| PublishError::MalformedResponse {
            stage,
            detail: "missing 'response' field".to_string(),
        })
    }
}

/// `photos.getWallUploadServer`
#[derive(Debug, Deserialize)]
pub struct UploadServer {
    pub upload_url: String,
}

/// Body returned by the upload server
#[derive(Debug, Default, Deserialize)]
pub struct UploadResponse {
    pub server: Option<i64>,
    pub photo: Option<String>,
    pub hash: Option<String>,
    /// Upload servers report failures as a bare string or an object
    pub error: Option<serde_json::Value>,
}

impl UploadResponse {
    /// A missing, blank or `[]` photo token means the remote end has not
    /// finished processing the upload yet.
    pub fn has_asset_token(&self) -> bool {
        match self.photo.as_deref().map(str::trim) {
            None | Some("") | Some("[]") => false,
            Some(_) => true,
        }
    }

    /// The asset reference, if the response carries a usable token
    pub fn into_asset(self) -> Option<RemoteAssetRef> {
        if !self.has_asset_token() {
            return None;
        }

        Some(RemoteAssetRef {
            server: self.server.unwrap_or_default(),
            photo: self.photo.unwrap_or_default(),
            hash: self.hash.unwrap_or_default(),
        })
    }
}

/// One element of the `photos.saveWallPhoto` response array
#[derive(Debug, Deserialize)]
pub struct SavedPhoto {
    pub owner_id: i64,
    pub id: i64,
}

impl SavedPhoto {
    /// Attachment reference accepted by `wall.post`
    pub fn attachment(&self) -> String {
        format!("photo{}_{}", self.owner_id, self.id)
    }
}

/// `wall.post`
#[derive(Debug, Deserialize)]
pub struct WallPostResponse {
    pub post_id: i64,
}
