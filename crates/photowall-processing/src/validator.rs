use photowall_core::{FileLimits, PublishError};
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Validation errors for photo files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File too small: {size} bytes (min: {min} bytes)")]
    FileTooSmall { size: u64, min: u64 },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ValidationError> for PublishError {
    fn from(err: ValidationError) -> Self {
        PublishError::ValidationFailed(err.to_string())
    }
}

/// Photo file validator
///
/// Checks run in a fixed order and the first failure wins: existence, then
/// extension allow-list (case-insensitive), then the `[min, max]` size bounds.
#[derive(Debug, Clone)]
pub struct FileValidator {
    allowed_extensions: Vec<String>,
    min_file_size: u64,
    max_file_size: u64,
    chunk_size: usize,
}

impl FileValidator {
    pub fn new(allowed_extensions: Vec<String>, min_file_size: u64, max_file_size: u64) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            min_file_size,
            max_file_size,
            chunk_size: photowall_core::constants::FILE_READ_CHUNK_SIZE,
        }
    }

    pub fn from_limits(limits: &FileLimits) -> Self {
        Self::new(
            limits.allowed_extensions.clone(),
            limits.min_size_bytes,
            limits.max_size_bytes,
        )
        .with_chunk_size(limits.read_chunk_size)
    }

    /// Chunk size used when streaming the file through the digest
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Validate file extension
    pub fn validate_extension(&self, path: &Path) -> Result<(), ValidationError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(path.display().to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate file size; the lower bound is checked first
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size < self.min_file_size {
            return Err(ValidationError::FileTooSmall {
                size,
                min: self.min_file_size,
            });
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Run all checks and return the file size on success
    pub async fn check(&self, path: &Path) -> Result<u64, ValidationError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ValidationError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(ValidationError::Io(e)),
        };

        if !metadata.is_file() {
            return Err(ValidationError::NotAFile(path.display().to_string()));
        }

        self.validate_extension(path)?;

        let size = metadata.len();
        self.validate_file_size(size)?;

        Ok(size)
    }

    /// Boolean form of [`check`](Self::check); failures are logged
    pub async fn validate(&self, path: &Path) -> bool {
        match self.check(path).await {
            Ok(size) => {
                tracing::debug!(path = %path.display(), size_bytes = size, "File passed validation");
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "File failed validation");
                false
            }
        }
    }

    /// SHA-256 of the file contents as lower-case hex.
    ///
    /// The file is streamed in fixed-size chunks on the blocking pool so the
    /// async workers are never stalled by disk reads.
    pub async fn digest(&self, path: &Path) -> io::Result<String> {
        let path: PathBuf = path.to_path_buf();
        let chunk_size = self.chunk_size;

        tokio::task::spawn_blocking(move || compute_digest(&path, chunk_size))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::from_limits(&FileLimits::default())
    }
}

fn compute_digest(path: &Path, chunk_size: usize) -> io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn test_validator() -> FileValidator {
        FileValidator::new(vec!["jpg".to_string(), ".PNG".to_string()], 1, 1024)
    }

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_validate_extension_ok() {
        let validator = test_validator();
        assert!(validator.validate_extension(Path::new("photo.jpg")).is_ok());
        assert!(validator.validate_extension(Path::new("photo.JPG")).is_ok()); // case insensitive
        assert!(validator.validate_extension(Path::new("photo.png")).is_ok());
    }

    #[test]
    fn test_validate_extension_invalid() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_extension(Path::new("photo.gif")),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validator.validate_extension(Path::new("noextension")),
            Err(ValidationError::InvalidFilename(_))
        ));
    }

    #[test]
    fn test_validate_file_size_bounds() {
        let validator = test_validator();
        assert!(validator.validate_file_size(1).is_ok());
        assert!(validator.validate_file_size(1024).is_ok());
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::FileTooSmall { size: 0, min: 1 })
        ));
        assert!(matches!(
            validator.validate_file_size(1025),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_check_ok_returns_size() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "photo.jpg", b"jpeg bytes");

        let validator = test_validator();
        assert_eq!(validator.check(&path).await.unwrap(), 10);
        assert!(validator.validate(&path).await);
    }

    #[tokio::test]
    async fn test_check_missing_file() {
        let dir = tempdir().unwrap();
        let validator = test_validator();

        let result = validator.check(&dir.path().join("absent.jpg")).await;
        assert!(matches!(result, Err(ValidationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_check_empty_file_fails_on_lower_bound() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "empty.jpg", b"");

        // Upper bound of zero would also fail; the lower bound must be reported first
        let validator = FileValidator::new(vec!["jpg".to_string()], 1, 0);
        let result = validator.check(&path).await;
        assert!(matches!(
            result,
            Err(ValidationError::FileTooSmall { size: 0, .. })
        ));
        assert!(!test_validator().validate(&path).await);
    }

    #[tokio::test]
    async fn test_check_extension_before_size() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "empty.gif", b"");

        let result = test_validator().check(&path).await;
        assert!(matches!(
            result,
            Err(ValidationError::InvalidExtension { .. })
        ));
    }

    #[tokio::test]
    async fn test_check_directory_rejected() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("folder.jpg");
        std::fs::create_dir(&nested).unwrap();

        let result = test_validator().check(&nested).await;
        assert!(matches!(result, Err(ValidationError::NotAFile(_))));
    }

    #[tokio::test]
    async fn test_digest_matches_known_value() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "photo.jpg", b"abc");

        // Small chunks force several reads
        let validator = test_validator().with_chunk_size(2);
        let digest = validator.digest(&path).await.unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_digest_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let validator = test_validator();
        assert!(validator.digest(&dir.path().join("gone.jpg")).await.is_err());
    }

    #[test]
    fn test_validation_error_converts_to_publish_error() {
        let err: PublishError = ValidationError::FileTooLarge { size: 10, max: 5 }.into();
        assert_eq!(err.kind(), photowall_core::FailureKind::ValidationFailed);
    }
}
