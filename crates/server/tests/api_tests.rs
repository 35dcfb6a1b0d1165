//! Integration tests for HTTP API endpoints.

mod common;

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use common::TestServer;
use common::fixtures::seeded_bytes;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Base64-encode a path and escape the characters base64 shares with URL
/// syntax so the value survives the query string.
fn b64(path: &str) -> String {
    BASE64
        .encode(path)
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

/// Helper to make a request with an empty body and parse the JSON response.
async fn json_request(router: &axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Helper for downloads; keeps the raw headers and body bytes.
async fn raw_get(router: &axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, headers, body)
}

#[tokio::test]
async fn info_reports_backend_name() {
    let server = TestServer::new().await;

    let (status, body) = json_request(&server.router, "GET", "/info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "tree"}));
}

#[tokio::test]
async fn list_empty_root() {
    let server = TestServer::new().await;

    let (status, body) = json_request(&server.router, "GET", "/list").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"dirs": [], "files": []}));
}

#[tokio::test]
async fn list_reports_entries_with_metadata() {
    let server = TestServer::new().await;
    let tree = server.tree_path();
    std::fs::create_dir(tree.join("docs")).unwrap();
    std::fs::write(tree.join("hello.txt"), b"hello").unwrap();
    std::fs::write(tree.join("docs").join("readme.txt"), b"0123456789").unwrap();

    // A missing path parameter lists the tree root.
    let (status, body) = json_request(&server.router, "GET", "/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dirs"], json!(["docs"]));
    assert_eq!(body["files"][0]["name"], "hello.txt");
    assert_eq!(body["files"][0]["size"], 5);

    let uri = format!("/list?path={}", b64("docs"));
    let (status, body) = json_request(&server.router, "GET", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dirs"], json!([]));
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
    assert_eq!(body["files"][0]["name"], "readme.txt");
    assert_eq!(body["files"][0]["size"], 10);
    assert!(body["files"][0]["mtime"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn list_rejects_path_traversal() {
    let server = TestServer::new().await;

    let uri = format!("/list?path={}", b64("../x"));
    let (status, body) = json_request(&server.router, "GET", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("invalid path"));
}

#[tokio::test]
async fn list_missing_directory_is_an_error() {
    let server = TestServer::new().await;

    let uri = format!("/list?path={}", b64("nope"));
    let (status, body) = json_request(&server.router, "GET", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn list_rejects_bad_base64() {
    let server = TestServer::new().await;

    let (status, body) = json_request(&server.router, "GET", "/list?path=%21%21%21").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("bad request"));
}

#[tokio::test]
async fn download_streams_file_with_content_type() {
    let server = TestServer::new().await;
    let content = seeded_bytes(11, 3 * 1024);
    std::fs::write(server.tree_path().join("notes.txt"), &content).unwrap();

    let uri = format!("/download?path={}", b64("notes.txt"));
    let (status, headers, body) = raw_get(&server.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    // The body is streamed; no length is announced up front.
    assert!(headers.get(CONTENT_LENGTH).is_none());
    assert_eq!(body, content);
}

#[tokio::test]
async fn download_zero_byte_file() {
    let server = TestServer::new().await;
    std::fs::write(server.tree_path().join("blob"), b"").unwrap();

    let uri = format!("/download?path={}", b64("blob"));
    let (status, headers, body) = raw_get(&server.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
    assert!(body.is_empty());
}

#[tokio::test]
async fn download_missing_file_is_an_error() {
    let server = TestServer::new().await;

    let uri = format!("/download?path={}", b64("ghost.txt"));
    let (status, body) = json_request(&server.router, "GET", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn download_on_directory_is_an_error() {
    let server = TestServer::new().await;
    std::fs::create_dir(server.tree_path().join("docs")).unwrap();

    let uri = format!("/download?path={}", b64("docs"));
    let (status, body) = json_request(&server.router, "GET", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn mkdir_creates_directory() {
    let server = TestServer::new().await;

    let uri = format!("/mkdir?path={}", b64("newdir"));
    let (status, body) = json_request(&server.router, "POST", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(server.tree_path().join("newdir").is_dir());

    // Creating the same directory again fails.
    let (status, _) = json_request(&server.router, "POST", &uri).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn mkdir_requires_existing_parent() {
    let server = TestServer::new().await;

    let uri = format!("/mkdir?path={}", b64("a/b"));
    let (status, _) = json_request(&server.router, "POST", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!server.tree_path().join("a").exists());
}

#[tokio::test]
async fn rename_moves_file() {
    let server = TestServer::new().await;
    let tree = server.tree_path();
    std::fs::create_dir(tree.join("docs")).unwrap();
    std::fs::write(tree.join("draft.txt"), b"contents").unwrap();

    let uri = format!(
        "/rename?path={}&to={}",
        b64("draft.txt"),
        b64("docs/final.txt")
    );
    let (status, body) = json_request(&server.router, "PUT", &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(!tree.join("draft.txt").exists());
    assert_eq!(
        std::fs::read(tree.join("docs").join("final.txt")).unwrap(),
        b"contents"
    );
}

#[tokio::test]
async fn rename_missing_source_is_an_error() {
    let server = TestServer::new().await;

    let uri = format!("/rename?path={}&to={}", b64("ghost"), b64("elsewhere"));
    let (status, body) = json_request(&server.router, "PUT", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn delete_removes_file() {
    let server = TestServer::new().await;
    std::fs::write(server.tree_path().join("gone.txt"), b"x").unwrap();

    let uri = format!("/delete?path={}", b64("gone.txt"));
    let (status, body) = json_request(&server.router, "DELETE", &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(!server.tree_path().join("gone.txt").exists());

    // Deleting again reports the missing file.
    let (status, body) = json_request(&server.router, "DELETE", &uri).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn delete_on_directory_is_an_error() {
    let server = TestServer::new().await;
    std::fs::create_dir(server.tree_path().join("docs")).unwrap();

    let uri = format!("/delete?path={}", b64("docs"));
    let (status, _) = json_request(&server.router, "DELETE", &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(server.tree_path().join("docs").is_dir());
}

#[tokio::test]
async fn rmdir_removes_subtree() {
    let server = TestServer::new().await;
    let tree = server.tree_path();
    std::fs::create_dir_all(tree.join("a").join("b").join("c")).unwrap();
    std::fs::write(tree.join("a").join("top.txt"), b"1").unwrap();
    std::fs::write(tree.join("a").join("b").join("mid.txt"), b"2").unwrap();
    std::fs::write(tree.join("a").join("b").join("c").join("leaf.txt"), b"3").unwrap();

    let uri = format!("/rmdir?path={}", b64("a"));
    let (status, body) = json_request(&server.router, "DELETE", &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(!tree.join("a").exists());
}

#[tokio::test]
async fn unknown_route_reports_not_found() {
    let server = TestServer::new().await;

    let (status, body) = json_request(&server.router, "GET", "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "not found"}));
}
