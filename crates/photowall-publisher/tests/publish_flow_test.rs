//! End-to-end publish flow against a mock wall API server

use mockito::{Matcher, Server, ServerGuard};
use photowall_core::{ApiCredentials, FailureKind, UploadResult};
use photowall_infra::RateLimiter;
use photowall_processing::FileValidator;
use photowall_publisher::{RemotePublisher, RetryPolicy, UploadAttempt, VkApiClient, WallApi};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const GROUP_ID: u64 = 4242;

fn credentials(server: &ServerGuard) -> ApiCredentials {
    ApiCredentials {
        access_token: "user-token".to_string(),
        group_token: "group-token".to_string(),
        group_id: GROUP_ID,
        api_version: "5.199".to_string(),
        base_url: server.url(),
        request_timeout: Duration::from_secs(5),
        upload_timeout: Duration::from_secs(5),
    }
}

fn publisher(server: &ServerGuard) -> RemotePublisher {
    let client = VkApiClient::new(credentials(server)).unwrap();
    RemotePublisher::new(
        Arc::new(client),
        RateLimiter::new(3),
        Arc::new(FileValidator::new(vec!["jpg".to_string()], 1, 1024 * 1024)),
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        },
    )
}

fn photo_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    std::fs::write(&path, b"\xFF\xD8\xFFjpeg bytes").unwrap();
    (dir, path)
}

async fn mock_upload_target(server: &mut ServerGuard) -> mockito::Mock {
    let body = format!(r#"{{"response":{{"upload_url":"{}/upload"}}}}"#, server.url());
    server
        .mock("POST", "/photos.getWallUploadServer")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("access_token".into(), "user-token".into()),
            Matcher::UrlEncoded("group_id".into(), GROUP_ID.to_string()),
            Matcher::UrlEncoded("v".into(), "5.199".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

async fn mock_upload(server: &mut ServerGuard, body: &str, hits: usize) -> mockito::Mock {
    server
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

#[tokio::test]
async fn test_full_publish_flow() {
    let mut server = Server::new_async().await;
    let (_dir, path) = photo_file();

    let target = mock_upload_target(&mut server).await;
    let upload = mock_upload(
        &mut server,
        r#"{"server":842,"photo":"[{\"photo\":\"abc\"}]","hash":"f00"}"#,
        1,
    )
    .await;
    let save = server
        .mock("POST", "/photos.saveWallPhoto")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("server".into(), "842".into()),
            Matcher::UrlEncoded("hash".into(), "f00".into()),
            Matcher::UrlEncoded("photo".into(), r#"[{"photo":"abc"}]"#.into()),
        ]))
        .with_status(200)
        .with_body(r#"{"response":[{"id":456,"owner_id":-4242}]}"#)
        .expect(1)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/wall.post")
        .match_query(Matcher::UrlEncoded("access_token".into(), "group-token".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("owner_id".into(), "-4242".into()),
            Matcher::UrlEncoded("message".into(), "Hello wall".into()),
            Matcher::UrlEncoded("attachments".into(), "photo-4242_456".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"response":{"post_id":9001}}"#)
        .expect(1)
        .create_async()
        .await;

    let result = publisher(&server).publish(&path, "Hello wall").await;

    assert_eq!(result, UploadResult::Success { post_id: 9001 });
    assert!(!path.exists(), "file should be removed after a successful post");

    target.assert_async().await;
    upload.assert_async().await;
    save.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn test_save_error_leaves_file_on_disk() {
    let mut server = Server::new_async().await;
    let (_dir, path) = photo_file();

    let _target = mock_upload_target(&mut server).await;
    let _upload = mock_upload(&mut server, r#"{"server":1,"photo":"tok","hash":"h"}"#, 1).await;
    let _save = server
        .mock("POST", "/photos.saveWallPhoto")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"error":{"error_code":100,"error_msg":"photos_list is invalid"}}"#)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/wall.post")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = publisher(&server).publish(&path, "caption").await;

    assert_eq!(
        result,
        UploadResult::Failure {
            kind: FailureKind::RemoteRejected
        }
    );
    assert!(path.exists());
    post.assert_async().await;
}

#[tokio::test]
async fn test_upload_target_error_stops_pipeline() {
    let mut server = Server::new_async().await;
    let (_dir, path) = photo_file();

    let _target = server
        .mock("POST", "/photos.getWallUploadServer")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"error":{"error_code":5,"error_msg":"User authorization failed"}}"#)
        .expect(1)
        .create_async()
        .await;
    let upload = mock_upload(&mut server, "{}", 0).await;

    let result = publisher(&server).publish(&path, "caption").await;

    assert_eq!(
        result,
        UploadResult::Failure {
            kind: FailureKind::RemoteRejected
        }
    );
    upload.assert_async().await;
}

#[tokio::test]
async fn test_empty_token_on_every_attempt_exhausts_retries() {
    let mut server = Server::new_async().await;
    let (_dir, path) = photo_file();

    let _target = mock_upload_target(&mut server).await;
    let upload = mock_upload(&mut server, r#"{"server":1,"photo":"[]","hash":"h"}"#, 3).await;

    let result = publisher(&server).publish(&path, "caption").await;

    assert_eq!(
        result,
        UploadResult::Failure {
            kind: FailureKind::UploadExhausted
        }
    );
    assert!(path.exists());
    upload.assert_async().await;
}

#[tokio::test]
async fn test_malformed_save_response_is_rejection() {
    let mut server = Server::new_async().await;
    let (_dir, path) = photo_file();

    let _target = mock_upload_target(&mut server).await;
    let _upload = mock_upload(&mut server, r#"{"server":1,"photo":"tok","hash":"h"}"#, 1).await;
    let _save = server
        .mock("POST", "/photos.saveWallPhoto")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"response":[]}"#)
        .create_async()
        .await;

    let result = publisher(&server).publish(&path, "caption").await;

    assert_eq!(
        result,
        UploadResult::Failure {
            kind: FailureKind::RemoteRejected
        }
    );
}

#[tokio::test]
async fn test_client_upload_reports_empty_token_as_transient() {
    let mut server = Server::new_async().await;
    let (_dir, path) = photo_file();
    let _upload = mock_upload(&mut server, r#"{"server":1,"photo":"","hash":"h"}"#, 1).await;

    let client = VkApiClient::new(credentials(&server)).unwrap();
    let attempt = client
        .upload_photo(&format!("{}/upload", server.url()), &path)
        .await
        .unwrap();

    assert!(matches!(attempt, UploadAttempt::Transient { .. }));
}

#[tokio::test]
async fn test_client_upload_server_error_is_transient() {
    let mut server = Server::new_async().await;
    let (_dir, path) = photo_file();
    let _upload = server
        .mock("POST", "/upload")
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let client = VkApiClient::new(credentials(&server)).unwrap();
    let attempt = client
        .upload_photo(&format!("{}/upload", server.url()), &path)
        .await
        .unwrap();

    assert!(matches!(attempt, UploadAttempt::Transient { .. }));
}
