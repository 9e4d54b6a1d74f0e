use photowall_core::CleanupSettings;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::interval;

/// Deletes temp photos older than `max_age`.
///
/// Files younger than `max_age` are never touched, so a photo that an
/// in-flight task still owns is safe as long as tasks finish within that age.
#[derive(Debug, Clone)]
pub struct TempFileSweeper {
    dir: PathBuf,
    max_age: Duration,
    interval: Duration,
}

impl TempFileSweeper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            interval,
        }
    }

    pub fn from_settings(settings: &CleanupSettings) -> Self {
        Self::new(settings.temp_dir.clone(), settings.max_age, settings.interval)
    }

    /// Start the background sweep: once immediately, then every `interval`.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.interval.max(Duration::from_secs(1)));

            loop {
                sweep_interval.tick().await;

                match self.sweep_once().await {
                    Ok(removed) => {
                        tracing::debug!(removed, "Scheduled temp file sweep completed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Temp file sweep failed");
                    }
                }
            }
        })
    }

    /// Delete every regular file older than `max_age` and return how many
    /// were removed. A missing directory is not an error.
    #[tracing::instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn sweep_once(&self) -> Result<usize, anyhow::Error> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "Failed to stat temp file");
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let age = match metadata.modified() {
                Ok(modified) => now.duration_since(modified).unwrap_or_default(),
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "Failed to read modification time");
                    continue;
                }
            };

            if age <= self.max_age {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "Removed stale temp file");
                    removed += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "Failed to remove temp file");
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Removed stale temp files");
        }

        Ok(removed)
    }
}
