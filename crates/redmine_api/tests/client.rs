use std::io::{self, Write};
use std::time::Duration;

use mockito::{Matcher, Server};
use redmine_api::{Fetched, RedmineClient, RedmineConfig, RedmineError};
use serde_json::json;
use tempfile::TempDir;

const API_KEY: &str = "0123456789abcdef0123";

fn client_for(url: &str) -> RedmineClient {
    let config = RedmineConfig::new(url, API_KEY)
        .with_probe_timeout(Duration::from_secs(2))
        .with_timeout(Duration::from_secs(2))
        .with_download_timeout(Duration::from_secs(5));
    RedmineClient::new(config).expect("client builds")
}

#[tokio::test]
async fn fetch_issue_requests_journals_and_attachments() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/issues/42.json")
        .match_header("x-redmine-api-key", API_KEY)
        .match_query(Matcher::UrlEncoded(
            "include".into(),
            "journals,attachments".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"issue":{"id":42,"subject":"Printer on fire"}}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let fetched = client.fetch_issue(42).await.expect("fetch succeeds");

    mock.assert_async().await;
    let document = fetched.found().expect("issue present");
    assert_eq!(
        document.as_value(),
        &json!({"issue": {"id": 42, "subject": "Printer on fire"}})
    );
}

#[tokio::test]
async fn fetch_issue_maps_404_to_not_found() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/issues/7.json")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let fetched = client.fetch_issue(7).await.expect("404 is not an error");
    assert_eq!(fetched, Fetched::NotFound);
}

#[tokio::test]
async fn fetch_issue_reports_server_errors_with_context() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/issues/9.json")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("database exploded")
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.fetch_issue(9).await.expect_err("500 is an error");

    match &err {
        RedmineError::Issue { id, source } => {
            assert_eq!(*id, 9);
            match source.as_ref() {
                RedmineError::Http { path, status, message } => {
                    assert_eq!(path, "issues/9.json");
                    assert_eq!(status.as_u16(), 500);
                    assert_eq!(message, "database exploded");
                }
                other => panic!("unexpected inner error: {other:?}"),
            }
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_issue_rejects_malformed_json() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/issues/3.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.fetch_issue(3).await.expect_err("html is not json");
    match err {
        RedmineError::Issue { source, .. } => {
            assert!(matches!(*source, RedmineError::Malformed { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_is_an_authentication_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/issues/4.json")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let client = client_for(&server.url());
    let err = client.fetch_issue(4).await.expect_err("401 is an error");
    match err {
        RedmineError::Issue { source, .. } => {
            assert!(matches!(*source, RedmineError::Authentication { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn connectivity_check_succeeds_on_2xx() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/projects.json")
        .match_query(Matcher::UrlEncoded("limit".into(), "1".into()))
        .match_header("x-redmine-api-key", API_KEY)
        .with_status(200)
        .with_body(r#"{"projects":[],"total_count":0}"#)
        .create_async()
        .await;

    let client = client_for(&server.url());
    assert!(client.test_connectivity().await);
    mock.assert_async().await;
}

#[tokio::test]
async fn connectivity_check_is_false_on_error_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/projects.json")
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let client = client_for(&server.url());
    assert!(!client.test_connectivity().await);
}

#[tokio::test]
async fn connectivity_check_is_false_when_unreachable() {
    let client = client_for("http://127.0.0.1:1");
    assert!(!client.test_connectivity().await);
}

#[tokio::test]
async fn download_attachment_streams_body_to_disk() {
    let mut server = Server::new_async().await;
    let payload = vec![7u8; 64 * 1024];
    let mock = server
        .mock("GET", "/attachments/55")
        .match_header("x-redmine-api-key", API_KEY)
        .with_status(200)
        .with_header("content-type", "application/octet-stream")
        .with_body(payload.clone())
        .create_async()
        .await;

    let dir = TempDir::new().expect("temp dir");
    let destination = dir.path().join("attachments").join("10").join("dump.bin");

    let client = client_for(&server.url());
    assert!(client.download_attachment(55, &destination).await);
    mock.assert_async().await;

    let written = std::fs::read(&destination).expect("file written");
    assert_eq!(written, payload);
    assert!(!dir.path().join("attachments/10/dump.bin.part").exists());
}

#[tokio::test]
async fn download_attachment_failure_leaves_no_file() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/attachments/56")
        .with_status(404)
        .create_async()
        .await;

    let dir = TempDir::new().expect("temp dir");
    let destination = dir.path().join("10").join("missing.txt");

    let client = client_for(&server.url());
    assert!(!client.download_attachment(56, &destination).await);
    assert!(!destination.exists());
}

#[tokio::test]
async fn download_attachment_reports_write_failures() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/attachments/57")
        .with_status(200)
        .with_body("data")
        .create_async()
        .await;

    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").expect("write blocker");
    let destination = blocker.join("nested.txt");

    let client = client_for(&server.url());
    assert!(!client.download_attachment(57, &destination).await);
}

#[tokio::test]
async fn connectivity_check_ignores_the_body_of_2xx_replies() {
    let mut server = Server::new_async().await;
    let _html = server
        .mock("GET", "/projects.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>ok</html>")
        .create_async()
        .await;
    assert!(client_for(&server.url()).test_connectivity().await);

    let mut server = Server::new_async().await;
    let _empty = server
        .mock("GET", "/projects.json")
        .match_query(Matcher::Any)
        .with_status(204)
        .create_async()
        .await;
    assert!(client_for(&server.url()).test_connectivity().await);
}

#[tokio::test]
async fn only_json_requests_send_an_accept_header() {
    let mut server = Server::new_async().await;
    let issue = server
        .mock("GET", "/issues/5.json")
        .match_query(Matcher::Any)
        .match_header("accept", "application/json")
        .with_status(200)
        .with_body(r#"{"issue":{"id":5}}"#)
        .create_async()
        .await;
    let attachment = server
        .mock("GET", "/attachments/5")
        .match_header("accept", Matcher::Missing)
        .with_status(200)
        .with_body("binary")
        .create_async()
        .await;

    let dir = TempDir::new().expect("temp dir");
    let destination = dir.path().join("5").join("blob.bin");
    let client = client_for(&server.url());

    assert!(client.fetch_issue(5).await.expect("fetch succeeds").found().is_some());
    assert!(client.download_attachment(5, &destination).await);
    issue.assert_async().await;
    attachment.assert_async().await;
}

fn slow_body(writer: &mut dyn Write) -> io::Result<()> {
    std::thread::sleep(Duration::from_secs(3));
    writer.write_all(b"{}")
}

fn impatient_client(url: &str) -> RedmineClient {
    let config = RedmineConfig::new(url, API_KEY)
        .with_timeout(Duration::from_millis(500))
        .with_download_timeout(Duration::from_millis(500));
    RedmineClient::new(config).expect("client builds")
}

#[tokio::test]
async fn slow_issue_response_is_a_timeout() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/issues/6.json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_chunked_body(slow_body)
        .create_async()
        .await;

    let err = impatient_client(&server.url())
        .fetch_issue(6)
        .await
        .expect_err("request times out");
    match err {
        RedmineError::Issue { id, source } => {
            assert_eq!(id, 6);
            assert!(matches!(*source, RedmineError::Timeout { .. }), "{source:?}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_download_fails_without_leftovers() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/attachments/58")
        .with_status(200)
        .with_chunked_body(slow_body)
        .create_async()
        .await;

    let dir = TempDir::new().expect("temp dir");
    let destination = dir.path().join("slow.bin");

    let client = impatient_client(&server.url());
    assert!(!client.download_attachment(58, &destination).await);
    assert!(!destination.exists());
    assert!(!dir.path().join("slow.bin.part").exists());
}
