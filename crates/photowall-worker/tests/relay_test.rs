//! Relay behaviour with a scripted wall API

use async_trait::async_trait;
use photowall_core::{
    FailureKind, PublishError, PublishResult, PublishStage, RemoteAssetRef, StatsSettings,
    UploadTask,
};
use photowall_infra::RateLimiter;
use photowall_processing::{FileReadinessChecker, FileValidator, UploadPreparer};
use photowall_publisher::{RemotePublisher, RetryPolicy, UploadAttempt, WallApi};
use photowall_services::StatisticsAggregator;
use photowall_worker::{Acknowledgment, PhotoRelay, ShutdownSignal};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct ScriptedApi {
    reject_post: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl WallApi for ScriptedApi {
    async fn get_upload_server(&self) -> PublishResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("https://upload.test/photo".to_string())
    }

    async fn upload_photo(&self, _upload_url: &str, _path: &Path) -> PublishResult<UploadAttempt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(UploadAttempt::Uploaded(RemoteAssetRef {
            server: 1,
            photo: "token".to_string(),
            hash: "hash".to_string(),
        }))
    }

    async fn save_wall_photo(&self, _asset: &RemoteAssetRef) -> PublishResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("photo-1_2".to_string())
    }

    async fn wall_post(&self, _attachment: &str, _message: &str) -> PublishResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_post {
            return Err(PublishError::RemoteRejected {
                stage: PublishStage::Posting,
                code: 214,
                message: "Access to adding post denied".to_string(),
            });
        }
        Ok(77)
    }
}

fn relay(api: Arc<ScriptedApi>, report_interval: u64) -> PhotoRelay {
    let validator = Arc::new(FileValidator::new(vec!["jpg".to_string()], 1, 1024 * 1024));
    let preparer = Arc::new(UploadPreparer::new(
        FileReadinessChecker::new(3, Duration::from_millis(1)),
        validator.clone(),
    ));
    let publisher = RemotePublisher::new(
        api,
        RateLimiter::new(10),
        validator,
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        },
    );
    let stats = Arc::new(StatisticsAggregator::new(&StatsSettings {
        report_interval,
        ..StatsSettings::default()
    }));

    PhotoRelay::new(preparer, publisher, stats, ShutdownSignal::new())
}

fn photo(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"\xFF\xD8\xFFjpeg").unwrap();
    path
}

#[tokio::test]
async fn test_published_task_removes_file_and_counts_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = photo(&dir, "ok.jpg");
    let relay = relay(Arc::new(ScriptedApi::default()), 10);

    let ack = relay.handle(UploadTask::new(&path, "caption")).await;

    assert_eq!(ack, Acknowledgment::Published { post_id: 77 });
    assert!(!path.exists());

    let snapshot = relay.stats().snapshot();
    assert_eq!(snapshot.total.success, 1);
    assert_eq!(snapshot.total.errors, 0);
}

#[tokio::test]
async fn test_missing_file_is_not_ready_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(ScriptedApi::default());
    let relay = relay(api.clone(), 10);

    let ack = relay
        .handle(UploadTask::new(dir.path().join("never.jpg"), ""))
        .await;

    assert_eq!(ack, Acknowledgment::FileNotReady);
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    assert_eq!(relay.stats().snapshot().total.errors, 1);
}

#[tokio::test]
async fn test_invalid_extension_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = photo(&dir, "notes.txt");
    let api = Arc::new(ScriptedApi::default());
    let relay = relay(api.clone(), 10);

    let ack = relay.handle(UploadTask::new(&path, "")).await;

    assert_eq!(
        ack,
        Acknowledgment::Failed {
            kind: FailureKind::ValidationFailed
        }
    );
    assert!(path.exists());
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_remote_rejection_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = photo(&dir, "rejected.jpg");
    let api = Arc::new(ScriptedApi {
        reject_post: true,
        ..ScriptedApi::default()
    });
    let relay = relay(api, 10);

    let ack = relay.handle(UploadTask::new(&path, "")).await;

    assert_eq!(
        ack,
        Acknowledgment::Failed {
            kind: FailureKind::RemoteRejected
        }
    );
    assert!(path.exists());
    assert_eq!(relay.stats().snapshot().total.errors, 1);
}

#[tokio::test]
async fn test_shutdown_refuses_new_tasks_without_counting() {
    let dir = tempfile::tempdir().unwrap();
    let path = photo(&dir, "late.jpg");
    let api = Arc::new(ScriptedApi::default());
    let relay = relay(api.clone(), 10);

    relay.shutdown_signal().trigger();
    let ack = relay.handle(UploadTask::new(&path, "")).await;

    assert_eq!(ack, Acknowledgment::ShuttingDown);
    assert!(path.exists());
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    assert_eq!(relay.stats().snapshot().total.total, 0);
}

#[tokio::test]
async fn test_concurrent_tasks_share_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let relay = relay(Arc::new(ScriptedApi::default()), 2);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let relay = relay.clone();
            let path = photo(&dir, &format!("photo-{}.jpg", i));
            tokio::spawn(async move { relay.handle(UploadTask::new(path, "")).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_published());
    }

    let snapshot = relay.stats().snapshot();
    assert_eq!(snapshot.total.success, 4);
    assert_eq!(snapshot.daily.bucket.success, 4);
    assert!(relay.stats().should_report());
}

#[test]
fn test_acknowledgment_json_line() {
    let line = serde_json::to_string(&Acknowledgment::Published { post_id: 12 }).unwrap();
    assert_eq!(line, r#"{"status":"published","post_id":12}"#);
}
