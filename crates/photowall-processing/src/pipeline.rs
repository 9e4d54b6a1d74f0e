use crate::readiness::{FileProbe, FileReadinessChecker, FsProbe};
use crate::validator::FileValidator;
use photowall_core::{FileLimits, PublishError, PublishResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file that passed the local gate and may be handed to the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFile {
    pub path: PathBuf,
    pub size: u64,
    /// Hex SHA-256; `None` when the digest could not be computed
    pub digest: Option<String>,
}

/// Readiness wait, then validation, then an advisory digest
pub struct UploadPreparer<P: FileProbe = FsProbe> {
    readiness: FileReadinessChecker<P>,
    validator: Arc<FileValidator>,
}

impl UploadPreparer<FsProbe> {
    pub fn from_limits(limits: &FileLimits) -> Self {
        Self::new(
            FileReadinessChecker::from_limits(limits),
            Arc::new(FileValidator::from_limits(limits)),
        )
    }
}

impl<P: FileProbe> UploadPreparer<P> {
    pub fn new(readiness: FileReadinessChecker<P>, validator: Arc<FileValidator>) -> Self {
        Self {
            readiness,
            validator,
        }
    }

    /// Shared validator, reused by the publisher for its own re-check
    pub fn validator(&self) -> Arc<FileValidator> {
        self.validator.clone()
    }

    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn prepare(&self, path: &Path) -> PublishResult<PreparedFile> {
        if !self.readiness.check_ready(path).await {
            return Err(PublishError::NotReady {
                path: path.display().to_string(),
                attempts: self.readiness.max_attempts(),
            });
        }

        let size = self.validator.check(path).await?;

        let digest = match self.validator.digest(path).await {
            Ok(digest) => {
                tracing::info!(size_bytes = size, sha256 = %digest, "File prepared for upload");
                Some(digest)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not compute file digest, continuing without it");
                None
            }
        };

        Ok(PreparedFile {
            path: path.to_path_buf(),
            size,
            digest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photowall_core::FailureKind;
    use std::time::Duration;
    use tempfile::tempdir;

    fn preparer(max_size: u64) -> UploadPreparer {
        UploadPreparer::new(
            FileReadinessChecker::new(3, Duration::from_millis(1)),
            Arc::new(FileValidator::new(vec!["jpg".to_string()], 1, max_size)),
        )
    }

    #[tokio::test]
    async fn test_prepare_ok() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"abc").unwrap();

        let prepared = preparer(1024).prepare(&path).await.unwrap();
        assert_eq!(prepared.size, 3);
        assert_eq!(prepared.path, path);
        assert_eq!(
            prepared.digest.as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[tokio::test]
    async fn test_prepare_missing_file_not_ready() {
        let dir = tempdir().unwrap();
        let err = preparer(1024)
            .prepare(&dir.path().join("absent.jpg"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::NotReady);
        assert!(matches!(err, PublishError::NotReady { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_prepare_too_large_fails_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let err = preparer(16).prepare(&path).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::ValidationFailed);
    }

    #[tokio::test]
    async fn test_prepare_wrong_extension_fails_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photo.txt");
        std::fs::write(&path, b"not a photo").unwrap();

        let err = preparer(1024).prepare(&path).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::ValidationFailed);
    }
}
