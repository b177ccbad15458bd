//! HTTP surface tests

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use shifu_api::{DeviceShifu, new_device_shifu};

use common::{deps, metadata, thermometer_config};

fn setup() -> (Arc<DeviceShifu>, Router) {
    new_device_shifu(metadata("thermometer"), deps(thermometer_config(), Arc::default())).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_, router) = setup();
    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_readiness_follows_collection() {
    let (shifu, router) = setup();

    let (status, body) = send(&router, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    shifu.start_telemetry_collection().await;
    let (status, body) = send(&router, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collecting"], true);

    shifu.stop().await;
}

#[tokio::test]
async fn test_status_before_collection() {
    let (_, router) = setup();
    let (status, body) = send(&router, get("/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "thermometer");
    assert_eq!(body["protocol"], "HTTP");
    assert_eq!(body["phase"], "Pending");
    assert_eq!(body["collecting"], false);
    assert_eq!(body["telemetries"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_telemetry_loops() {
    let (shifu, router) = setup();
    shifu.start_telemetry_collection().await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    let (_, body) = send(&router, get("/status")).await;
    assert_eq!(body["phase"], "Running");
    let loops = body["telemetries"].as_array().unwrap();
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0]["name"], "temperature");
    assert_eq!(loops[0]["state"], "running");

    shifu.stop().await;
}

#[tokio::test]
async fn test_get_instruction() {
    let (_, router) = setup();
    let (status, body) = send(&router, get("/get_reading")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"temperature": 21.5}));
}

#[tokio::test]
async fn test_post_instruction_with_payload() {
    let (_, router) = setup();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"setpoint": 22}"#))
        .unwrap();

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"setpoint": 22}));
}

#[tokio::test]
async fn test_unknown_instruction() {
    let (_, router) = setup();
    let (status, body) = send(&router, get("/fly")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "INSTRUCTION_NOT_FOUND");
}

#[tokio::test]
async fn test_device_failure() {
    let (_, router) = setup();
    let (status, body) = send(&router, get("/broken")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "DEVICE_ERROR");
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}
