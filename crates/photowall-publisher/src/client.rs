//! Wall API client
//!
//! [`WallApi`] exposes the four remote calls of a publish. [`VkApiClient`]
//! implements them over HTTP. The client never retries; retry policy belongs
//! to the publisher.

use anyhow::Context;
use async_trait::async_trait;
use photowall_core::{ApiCredentials, PublishError, PublishResult, PublishStage, RemoteAssetRef};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;

use crate::publisher::UploadAttempt;
use crate::responses::{ApiEnvelope, SavedPhoto, UploadResponse, UploadServer, WallPostResponse};

/// Remote calls needed to publish one photo
#[async_trait]
pub trait WallApi: Send + Sync {
    /// URL the photo bytes must be uploaded to
    async fn get_upload_server(&self) -> PublishResult<String>;

    /// Upload the file; conditions worth retrying come back as
    /// [`UploadAttempt::Transient`], not as errors.
    async fn upload_photo(&self, upload_url: &str, path: &Path) -> PublishResult<UploadAttempt>;

    /// Register the uploaded photo and return its attachment reference
    async fn save_wall_photo(&self, asset: &RemoteAssetRef) -> PublishResult<String>;

    /// Create the wall post and return its id
    async fn wall_post(&self, attachment: &str, message: &str) -> PublishResult<i64>;
}

/// HTTP implementation of [`WallApi`]
pub struct VkApiClient {
    http_client: Client,
    upload_client: Client,
    credentials: ApiCredentials,
}

impl Debug for VkApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VkApiClient")
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl VkApiClient {
    pub fn new(credentials: ApiCredentials) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(credentials.request_timeout)
            .build()
            .context("Failed to create HTTP client for the wall API")?;

        let upload_client = Client::builder()
            .timeout(credentials.upload_timeout)
            .build()
            .context("Failed to create HTTP client for photo uploads")?;

        Ok(Self {
            http_client,
            upload_client,
            credentials,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.credentials.base_url, method)
    }

    /// POST a method call and unwrap its response envelope
    async fn call_method<T: DeserializeOwned>(
        &self,
        stage: PublishStage,
        method: &str,
        query: &[(&str, String)],
        form: Option<&[(&str, String)]>,
    ) -> PublishResult<T> {
        let mut request = self.http_client.post(self.method_url(method)).query(query);
        if let Some(form) = form {
            request = request.form(form);
        }

        // Tokens travel in the query string; keep the URL out of error text
        let response = request.send().await.map_err(|e| {
            PublishError::Unexpected(format!("{} request failed: {}", method, e.without_url()))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PublishError::Unexpected(format!(
                "Failed to read {} response: {}",
                method,
                e.without_url()
            ))
        })?;

        tracing::debug!(stage = %stage, method, status = %status, body = %body, "API response");

        if !status.is_success() {
            return Err(PublishError::RemoteRejected {
                stage,
                code: i64::from(status.as_u16()),
                message: body,
            });
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| PublishError::MalformedResponse {
                stage,
                detail: format!("{}: {}", method, e),
            })?;

        envelope.into_result(stage)
    }
}

#[async_trait]
impl WallApi for VkApiClient {
    async fn get_upload_server(&self) -> PublishResult<String> {
        let query = [
            ("access_token", self.credentials.access_token.clone()),
            ("group_id", self.credentials.group_id.to_string()),
            ("v", self.credentials.api_version.clone()),
        ];

        let server: UploadServer = self
            .call_method(
                PublishStage::GetTarget,
                "photos.getWallUploadServer",
                &query,
                None,
            )
            .await?;

        Ok(server.upload_url)
    }

    async fn upload_photo(&self, upload_url: &str, path: &Path) -> PublishResult<UploadAttempt> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PublishError::Unexpected(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo.jpg")
            .to_string();
        let form = Form::new().part("photo", Part::bytes(bytes).file_name(file_name));

        let response = match self.upload_client.post(upload_url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(UploadAttempt::Transient {
                    reason: format!("network error: {}", e),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Ok(UploadAttempt::Transient {
                reason: format!("upload server returned {}: {}", status, error_text),
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Ok(UploadAttempt::Transient {
                    reason: format!("failed to read upload response: {}", e),
                });
            }
        };
        tracing::debug!(body = %body, "Upload response");

        let upload: UploadResponse = match serde_json::from_str(&body) {
            Ok(upload) => upload,
            Err(e) => {
                return Ok(UploadAttempt::Transient {
                    reason: format!("unparseable upload response: {}", e),
                });
            }
        };

        if let Some(error) = &upload.error {
            return Ok(UploadAttempt::Transient {
                reason: format!("upload server error: {}", error),
            });
        }

        Ok(match upload.into_asset() {
            Some(asset) => UploadAttempt::Uploaded(asset),
            None => UploadAttempt::Transient {
                reason: "empty photo token".to_string(),
            },
        })
    }

    async fn save_wall_photo(&self, asset: &RemoteAssetRef) -> PublishResult<String> {
        let query = [
            ("access_token", self.credentials.access_token.clone()),
            ("group_id", self.credentials.group_id.to_string()),
            ("server", asset.server.to_string()),
            ("photo", asset.photo.clone()),
            ("hash", asset.hash.clone()),
            ("v", self.credentials.api_version.clone()),
        ];

        let saved: Vec<SavedPhoto> = self
            .call_method(PublishStage::Saving, "photos.saveWallPhoto", &query, None)
            .await?;

        saved
            .first()
            .map(SavedPhoto::attachment)
            .ok_or_else(|| PublishError::MalformedResponse {
                stage: PublishStage::Saving,
                detail: "empty 'response' array".to_string(),
            })
    }

    async fn wall_post(&self, attachment: &str, message: &str) -> PublishResult<i64> {
        let query = [
            ("access_token", self.credentials.group_token.clone()),
            ("v", self.credentials.api_version.clone()),
        ];
        let form = [
            ("owner_id", self.credentials.wall_owner_id().to_string()),
            ("message", message.to_string()),
            ("attachments", attachment.to_string()),
        ];

        let post: WallPostResponse = self
            .call_method(PublishStage::Posting, "wall.post", &query, Some(&form[..]))
            .await?;

        Ok(post.post_id)
    }
}
