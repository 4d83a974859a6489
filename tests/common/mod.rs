//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use inhome_gateway::{ApiState, DbPool, db};
use tower::ServiceExt;

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Build the full API router over a fresh in-memory database
#[must_use]
pub fn build_test_router() -> Router {
    inhome_gateway::api::router(Arc::new(ApiState::new(setup_test_db())))
}

/// Send one request and return the status and parsed JSON body
///
/// Empty bodies come back as `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Register a device through the API, asserting success
pub async fn create_device(app: &Router, mac: &str, ipv4: &str, name: &str) {
    let (status, _) = send(
        app,
        Method::POST,
        "/v1/device-management",
        Some(serde_json::json!({ "mac": mac, "ipv4": ipv4, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "failed to create device {name}");
}
