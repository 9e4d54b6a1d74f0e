//! File readiness detection
//!
//! A photo handed over by the chat layer may still be in the middle of being
//! written. [`FileReadinessChecker`] polls the path with exponential backoff and
//! declares it ready once two consecutive probes see the same non-zero size.

use async_trait::async_trait;
use photowall_core::FileLimits;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// What a single probe of the path observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Missing,
    Empty,
    Unreadable(String),
    Readable { size: u64 },
}

/// One look at a file on disk
#[async_trait]
pub trait FileProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> ProbeOutcome;
}

/// Probe backed by the real filesystem: stat, then read the first chunk
#[derive(Debug, Clone)]
pub struct FsProbe {
    chunk_size: usize,
}

impl FsProbe {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for FsProbe {
    fn default() -> Self {
        Self::new(photowall_core::constants::FILE_READ_CHUNK_SIZE)
    }
}

#[async_trait]
impl FileProbe for FsProbe {
    async fn probe(&self, path: &Path) -> ProbeOutcome {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ProbeOutcome::Missing,
            Err(e) => return ProbeOutcome::Unreadable(e.to_string()),
        };

        let size = metadata.len();
        if size == 0 {
            return ProbeOutcome::Empty;
        }

        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) => return ProbeOutcome::Unreadable(e.to_string()),
        };

        let mut buffer = vec![0u8; self.chunk_size];
        match file.read(&mut buffer).await {
            Ok(0) => ProbeOutcome::Unreadable("no data could be read".to_string()),
            Ok(_) => ProbeOutcome::Readable { size },
            Err(e) => ProbeOutcome::Unreadable(e.to_string()),
        }
    }
}

/// Waits for a file to stop growing
pub struct FileReadinessChecker<P: FileProbe = FsProbe> {
    probe: P,
    max_attempts: u32,
    initial_delay: Duration,
}

impl FileReadinessChecker<FsProbe> {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self::with_probe(FsProbe::default(), max_attempts, initial_delay)
    }

    pub fn from_limits(limits: &FileLimits) -> Self {
        Self::with_probe(
            FsProbe::new(limits.read_chunk_size),
            limits.ready_max_attempts,
            limits.ready_initial_delay,
        )
    }
}

impl<P: FileProbe> FileReadinessChecker<P> {
    pub fn with_probe(probe: P, max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            probe,
            max_attempts,
            initial_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Poll with the configured attempt budget and initial delay
    pub async fn check_ready(&self, path: &Path) -> bool {
        self.wait_until_ready(path, self.max_attempts, self.initial_delay)
            .await
    }

    /// Poll `path` up to `max_attempts` times.
    ///
    /// Returns `true` on the first attempt whose size equals the size seen on
    /// the immediately preceding attempt. A missing, empty or unreadable file
    /// does not update the remembered size. Between attempts the task sleeps
    /// `initial_delay * 2^attempt`.
    #[tracing::instrument(skip(self, path, initial_delay), fields(path = %path.display()))]
    pub async fn wait_until_ready(
        &self,
        path: &Path,
        max_attempts: u32,
        initial_delay: Duration,
    ) -> bool {
        let mut previous_size: Option<u64> = None;

        for attempt in 0..max_attempts {
            match self.probe.probe(path).await {
                ProbeOutcome::Readable { size } => {
                    if attempt > 0 && previous_size == Some(size) {
                        tracing::debug!(
                            size_bytes = size,
                            attempt = attempt + 1,
                            "File is ready"
                        );
                        return true;
                    }
                    previous_size = Some(size);
                }
                ProbeOutcome::Missing => {
                    tracing::warn!(attempt = attempt + 1, max_attempts, "File does not exist yet");
                }
                ProbeOutcome::Empty => {
                    tracing::warn!(attempt = attempt + 1, max_attempts, "File is empty");
                }
                ProbeOutcome::Unreadable(reason) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        error = %reason,
                        "File could not be read"
                    );
                }
            }

            if attempt + 1 < max_attempts {
                tokio::time::sleep(backoff(initial_delay, attempt)).await;
            }
        }

        tracing::error!(max_attempts, "File not ready after all attempts");
        false
    }
}

fn backoff(initial_delay: Duration, attempt: u32) -> Duration {
    initial_delay.saturating_mul(2u32.saturating_pow(attempt))
}
