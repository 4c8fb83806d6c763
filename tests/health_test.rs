mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn liveness_reports_healthy() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "forecast-api");
}

#[tokio::test]
async fn readiness_reports_database_up() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
}

#[tokio::test]
async fn detailed_health_includes_component_latency() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health/detailed").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert!(body["details"]["database"]["latency_ms"].is_number());
}

#[tokio::test]
async fn api_status_reports_service_metadata() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["service"], "forecast-api");
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn responses_carry_a_request_id_header() {
    let app = TestApp::new().await;

    let (_, body) = app.get("/api/v1/status").await;

    assert!(body["meta"]["request_id"].is_string());
}
