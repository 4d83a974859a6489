//! API endpoint integration tests

use axum::http::{Method, StatusCode};
use serde_json::json;

mod common;
use common::{build_test_router, create_device, send};

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router();

    let (status, json) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = build_test_router();

    let (status, json) = send(&app, Method::GET, "/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["database"]["status"], "ok");
}

#[tokio::test]
async fn test_create_and_list_devices() {
    let app = build_test_router();

    let (status, created) = send(
        &app,
        Method::POST,
        "/v1/device-management",
        Some(json!({ "mac": "aa:aa:aa:aa:aa:aa", "ipv4": "192.168.1.10", "name": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["mac"], "AA:AA:AA:AA:AA:AA");

    let (status, devices) = send(&app, Method::GET, "/v1/device-management", None).await;
    assert_eq!(status, StatusCode::OK);

    let devices = devices.as_array().unwrap();
    assert_eq!(devices.len(), 1);
    let device = &devices[0];
    assert_eq!(device["name"], "A");
    assert_eq!(device["ipv4"], "192.168.1.10");
    assert_eq!(device["mac"], "AA:AA:AA:AA:AA:AA");
    assert_eq!(device["is_trusted"], false);
    assert!(device["date_added"].is_i64());
    assert!(device.get("ipv6").is_some());
}

#[tokio::test]
async fn test_create_device_conflicts() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "A").await;

    // Same MAC, different name
    let (status, json) = send(
        &app,
        Method::POST,
        "/v1/device-management",
        Some(json!({ "mac": "AA:AA:AA:AA:AA:AA", "ipv4": "192.168.1.11", "name": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");

    // Same name, different MAC
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/device-management",
        Some(json!({ "mac": "BB:BB:BB:BB:BB:BB", "ipv4": "192.168.1.11", "name": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_device_invalid_input() {
    let app = build_test_router();

    for body in [
        json!({ "mac": "AA:AA:AA:AA:AA", "ipv4": "192.168.1.10", "name": "A" }),
        json!({ "mac": "AA:AA:AA:AA:AA:AA", "ipv4": "300.1.1.1", "name": "A" }),
        json!({ "mac": "AA:AA:AA:AA:AA:AA", "ipv4": "192.168.1.10" }),
        json!({ "mac": "AA:AA:AA:AA:AA:AA", "ipv4": "192.168.1.10", "name": "" }),
    ] {
        let (status, json) =
            send(&app, Method::POST, "/v1/device-management", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "invalid_input");
    }

    let (_, devices) = send(&app, Method::GET, "/v1/device-management", None).await;
    assert!(devices.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = build_test_router();

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/v1/device-management")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remove_device() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "A").await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/v1/device-management",
        Some(json!({ "mac": "BB:BB:BB:BB:BB:BB" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/v1/device-management",
        Some(json!({ "mac": "AA:AA:AA:AA:AA:AA" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, devices) = send(&app, Method::GET, "/v1/device-management", None).await;
    assert!(devices.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_device() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "A").await;
    create_device(&app, "CC:CC:CC:CC:CC:CC", "192.168.1.12", "C").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/device-management",
        Some(json!({ "old": "A", "new": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Renaming onto an existing name leaves the device untouched
    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/device-management",
        Some(json!({ "old": "B", "new": "C" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/device-management",
        Some(json!({ "old": "A", "new": "D" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, devices) = send(&app, Method::GET, "/v1/device-management", None).await;
    let mut names: Vec<&str> = devices
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["B", "C"]);
}

#[tokio::test]
async fn test_create_and_list_policies() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "X").await;
    create_device(&app, "BB:BB:BB:BB:BB:BB", "192.168.1.11", "Y").await;

    let (status, first) = send(
        &app,
        Method::POST,
        "/v1/policy-management",
        Some(json!({ "namedevicefrom": "X", "namedeviceto": "Y" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first_id = first["policyId"].as_i64().unwrap();

    let (_, second) = send(
        &app,
        Method::POST,
        "/v1/policy-management",
        Some(json!({ "namedevicefrom": "Y", "namedeviceto": "X" })),
    )
    .await;
    assert_eq!(second["policyId"].as_i64().unwrap(), first_id + 1);

    let (status, policies) = send(&app, Method::GET, "/v1/policy-management", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        policies,
        json!([
            { "device_1": "X", "device_2": "Y", "policyId": first_id },
            { "device_1": "Y", "device_2": "X", "policyId": first_id + 1 },
        ])
    );
}

#[tokio::test]
async fn test_create_policy_unknown_device() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "X").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/policy-management",
        Some(json!({ "namedevicefrom": "X", "namedeviceto": "ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, policies) = send(&app, Method::GET, "/v1/policy-management", None).await;
    assert!(policies.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_policy() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "X").await;
    create_device(&app, "BB:BB:BB:BB:BB:BB", "192.168.1.11", "Y").await;

    let (_, policy) = send(
        &app,
        Method::POST,
        "/v1/policy-management",
        Some(json!({ "namedevicefrom": "X", "namedeviceto": "Y" })),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/v1/policy-management",
        Some(json!({ "policyId": policy["policyId"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/v1/policy-management",
        Some(json!({ "policyId": policy["policyId"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_device_policy_lookup_end_to_end() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "A").await;
    create_device(&app, "BB:BB:BB:BB:BB:BB", "192.168.1.11", "B").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/policy-management",
        Some(json!({ "namedevicefrom": "A", "namedeviceto": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, peers) = send(&app, Method::GET, "/v1/policy-management/A", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        peers,
        json!([{ "name": "B", "ipv4": "192.168.1.11", "mac": "BB:BB:BB:BB:BB:BB" }])
    );

    let (status, _) = send(&app, Method::GET, "/v1/policy-management/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_device_policy_lookup_with_encoded_name() {
    let app = build_test_router();
    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "living room").await;
    create_device(&app, "BB:BB:BB:BB:BB:BB", "192.168.1.11", "B").await;
    send(
        &app,
        Method::POST,
        "/v1/policy-management",
        Some(json!({ "namedevicefrom": "B", "namedeviceto": "living room" })),
    )
    .await;

    let (status, peers) = send(
        &app,
        Method::GET,
        "/v1/policy-management/living%20room",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(peers[0]["name"], "B");
}

#[tokio::test]
async fn test_revision_tracks_mutations() {
    let app = build_test_router();

    let (status, _) = send(&app, Method::GET, "/v1/revision", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    create_device(&app, "AA:AA:AA:AA:AA:AA", "192.168.1.10", "A").await;
    let (status, first) = send(&app, Method::GET, "/v1/revision", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(first["revisionDate"].is_i64());

    // A rejected mutation does not move the revision
    send(
        &app,
        Method::POST,
        "/v1/device-management",
        Some(json!({ "mac": "AA:AA:AA:AA:AA:AA", "ipv4": "192.168.1.10", "name": "A" })),
    )
    .await;
    let (_, unchanged) = send(&app, Method::GET, "/v1/revision", None).await;
    assert_eq!(unchanged["revisionId"], first["revisionId"]);

    create_device(&app, "BB:BB:BB:BB:BB:BB", "192.168.1.11", "B").await;
    let (_, second) = send(&app, Method::GET, "/v1/revision", None).await;
    assert_eq!(
        second["revisionId"].as_i64().unwrap(),
        first["revisionId"].as_i64().unwrap() + 1
    );
}
