//! Integration tests for the health endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;

use common::{body_json, get};

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let harness = common::build_test_app();
    let response = get(harness.app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["store_healthy"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let harness = common::build_test_app();
    let response = get(harness.app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let harness = common::build_test_app();
    let response = get(harness.app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );
}
