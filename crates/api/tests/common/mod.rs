//! Shared harness for API integration tests.
//!
//! Builds the production router (same middleware stack as `main.rs`)
//! over the in-memory store and queue, so the whole suite runs without
//! external infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use finsight_api::config::ServerConfig;
use finsight_api::router::build_app_router;
use finsight_api::state::AppState;
use finsight_core::artifacts::ArtifactStore;
use finsight_db::MemoryJobStore;
use finsight_queue::MemoryQueue;

/// Multipart boundary used by [`multipart_request`].
pub const BOUNDARY: &str = "finsight-test-boundary";

/// Everything a test needs: the app plus direct handles on the
/// in-memory collaborators for assertions.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryJobStore>,
    pub queue: Arc<MemoryQueue>,
    pub artifacts: Arc<ArtifactStore>,
    _dir: tempfile::TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

/// Build the full application router over in-memory collaborators.
pub fn build_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryJobStore::new());
    let queue = Arc::new(MemoryQueue::new());
    let artifacts = Arc::new(ArtifactStore::new(
        dir.path().join("staging"),
        dir.path().join("outputs"),
    ));
    let config = test_config();

    let state = AppState {
        store: store.clone(),
        transport: queue.clone(),
        artifacts: artifacts.clone(),
        config: Arc::new(config.clone()),
    };

    TestApp {
        app: build_app_router(state, &config),
        store,
        queue,
        artifacts,
        _dir: dir,
    }
}

/// Issue a GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Issue a DELETE request.
pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Build a `POST /analyze` multipart request with a file part and an
/// optional query part.
pub fn multipart_request(file_name: &str, content: &[u8], query: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    if let Some(query) = query {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"query\"\r\n\r\n\
                 {query}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Submit a document and return the parsed 202 response body.
pub async fn submit(app: Router, file_name: &str, content: &[u8], query: Option<&str>) -> serde_json::Value {
    let response = app
        .oneshot(multipart_request(file_name, content, query))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    body_json(response).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
