mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn empty_store_lists_no_metrics() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn seeded_metrics_are_listed_with_counts() {
    let app = TestApp::new().await;
    app.seed_series("cpu_usage_percent", 48, common::daily_pattern)
        .await;
    app.seed_series("memory_usage_mb", 24, |_| 512.0).await;

    let (status, body) = app.get("/api/v1/metrics").await;

    assert_eq!(status, StatusCode::OK);
    let metrics = body["data"].as_array().expect("array expected");
    assert_eq!(metrics.len(), 2);
    // Ordered by name
    assert_eq!(metrics[0]["name"], "cpu_usage_percent");
    assert_eq!(metrics[0]["sample_count"], 48);
    assert_eq!(metrics[1]["name"], "memory_usage_mb");
    assert_eq!(metrics[1]["sample_count"], 24);
    assert!(metrics[0]["latest_at"].is_string());
}

#[tokio::test]
async fn recording_samples_returns_created() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/v1/metrics/network_latency_ms/samples",
            json!({
                "samples": [
                    {"timestamp": "2026-08-01T00:00:00Z", "value": 12.5},
                    {"timestamp": "2026-08-01T01:00:00Z", "value": 13.0},
                    {"timestamp": "2026-08-01T02:00:00Z", "value": 11.75}
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["metric"], "network_latency_ms");
    assert_eq!(body["data"]["recorded"], 3);

    let (_, body) = app.get("/api/v1/metrics").await;
    assert_eq!(body["data"][0]["sample_count"], 3);
}

#[tokio::test]
async fn empty_sample_batch_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/v1/metrics/network_latency_ms/samples",
            json!({"samples": []}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Validation"));
}
