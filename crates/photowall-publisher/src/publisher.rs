//! Remote publish state machine
//!
//! `Idle -> GetTarget -> Uploading -> Saving -> Posting -> Done`, with an
//! exit to `Failed` from every stage. Only the upload step is retried. The
//! local file is removed after `Done` and kept after `Failed`.

use futures::FutureExt;
use photowall_core::{
    PublishError, PublishResult, PublishSettings, PublishStage, RemoteAssetRef, UploadResult,
};
use photowall_infra::RateLimiter;
use photowall_processing::FileValidator;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::client::WallApi;

/// Result of one upload attempt as seen by the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadAttempt {
    Uploaded(RemoteAssetRef),
    /// Worth another attempt: empty asset token, network or server hiccup
    Transient { reason: String },
}

/// Retry budget of the upload step
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, 1-indexed
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &PublishSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: settings.retry_base_delay,
        }
    }

    /// Delay before attempt `attempt + 1`: `base_delay * 2^(attempt-1)`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&PublishSettings::default())
    }
}

/// Drives one photo through the four remote steps
#[derive(Clone)]
pub struct RemotePublisher {
    api: Arc<dyn WallApi>,
    rate_limiter: RateLimiter,
    validator: Arc<FileValidator>,
    retry: RetryPolicy,
}

impl RemotePublisher {
    pub fn new(
        api: Arc<dyn WallApi>,
        rate_limiter: RateLimiter,
        validator: Arc<FileValidator>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            rate_limiter,
            validator,
            retry,
        }
    }

    /// Publish `path` with `caption`.
    ///
    /// Never fails and never panics: every error, including a panic inside a
    /// step, comes back as [`UploadResult::Failure`].
    #[tracing::instrument(skip(self, path, caption), fields(path = %path.display()))]
    pub async fn publish(&self, path: &Path, caption: &str) -> UploadResult {
        let mut stage = PublishStage::Idle;

        let outcome = AssertUnwindSafe(self.run(path, caption, &mut stage))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(post_id)) => UploadResult::Success { post_id },
            Ok(Err(e)) => {
                match e.log_level() {
                    photowall_core::LogLevel::Warn => {
                        tracing::warn!(failed_at = %stage, error = %e, "Publish rejected");
                    }
                    photowall_core::LogLevel::Error => {
                        tracing::error!(failed_at = %stage, error = %e, "Publish failed");
                    }
                }
                UploadResult::Failure { kind: e.kind() }
            }
            Err(panic) => {
                let error = PublishError::Unexpected(panic_message(panic.as_ref()));
                tracing::error!(failed_at = %stage, error = %error, "Publish panicked");
                UploadResult::Failure { kind: error.kind() }
            }
        }
    }

    async fn run(
        &self,
        path: &Path,
        caption: &str,
        stage: &mut PublishStage,
    ) -> PublishResult<i64> {
        self.rate_limiter.acquire().await;

        // The file may have changed since the readiness check
        self.validator.check(path).await?;

        *stage = PublishStage::GetTarget;
        let upload_url = self.api.get_upload_server().await?;

        *stage = PublishStage::Uploading;
        let asset = self.upload_with_retry(&upload_url, path).await?;

        *stage = PublishStage::Saving;
        let attachment = self.api.save_wall_photo(&asset).await?;

        *stage = PublishStage::Posting;
        let post_id = self.api.wall_post(&attachment, caption).await?;

        *stage = PublishStage::Done;
        tracing::info!(post_id, attachment = %attachment, "Post published");

        self.cleanup(path).await;
        Ok(post_id)
    }

    /// Upload with up to `max_retries` attempts. The backoff sleep suspends
    /// only this task.
    #[tracing::instrument(skip(self, upload_url, path))]
    async fn upload_with_retry(&self, upload_url: &str, path: &Path) -> PublishResult<RemoteAssetRef> {
        let max_retries = self.retry.max_retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_retries {
            match self.api.upload_photo(upload_url, path).await? {
                UploadAttempt::Uploaded(asset) => {
                    if attempt > 1 {
                        tracing::info!(attempt, max_retries, "Upload succeeded after retry");
                    }
                    return Ok(asset);
                }
                UploadAttempt::Transient { reason } => {
                    if attempt < max_retries {
                        let delay = self.retry.delay_after(attempt);
                        tracing::warn!(
                            attempt,
                            max_retries,
                            delay_ms = delay.as_millis() as u64,
                            reason = %reason,
                            "Upload attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = reason;
                }
            }
        }

        Err(PublishError::UploadExhausted {
            attempts: max_retries,
            last_error,
        })
    }

    async fn cleanup(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Local file removed after publish");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Local file already removed");
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "Failed to remove local file");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with non-string payload".to_string()
    }
}
