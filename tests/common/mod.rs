#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, DurationRound, Utc};
use forecast_api::{
    config::AppConfig,
    db::{self, DbConfig},
    services::metrics::NewSample,
    AppState,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Helper harness for spinning up an application backed by an in-memory
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_000,
            "test".to_string(),
        );

        // A single connection keeps the in-memory database alive and shared
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = forecast_api::build_router(state.clone());

        Self { router, state }
    }

    /// The newest whole hour, used as the anchor for seeded series.
    pub fn anchor() -> DateTime<Utc> {
        Utc::now()
            .duration_trunc(Duration::hours(1))
            .expect("hour truncation")
    }

    /// Seed `hours` hourly samples ending at the current hour, with values
    /// produced by `value_at(hours_ago)`.
    pub async fn seed_series<F>(&self, metric: &str, hours: i64, value_at: F)
    where
        F: Fn(i64) -> f64,
    {
        self.seed_series_at(metric, 0, hours, value_at).await;
    }

    /// Seed `hours` hourly samples ending `offset_hours` before the current
    /// hour.
    pub async fn seed_series_at<F>(&self, metric: &str, offset_hours: i64, hours: i64, value_at: F)
    where
        F: Fn(i64) -> f64,
    {
        let anchor = Self::anchor();
        let samples: Vec<NewSample> = (0..hours)
            .map(|i| NewSample {
                recorded_at: anchor - Duration::hours(offset_hours + i),
                value: value_at(offset_hours + i),
            })
            .collect();

        self.state
            .services
            .store
            .record_samples(metric, samples)
            .await
            .expect("failed to seed series");
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str) -> (StatusCode, Value) {
        self.request(Method::POST, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(body)).await
    }

    /// POST a raw body as application/json without serializing it first,
    /// for exercising malformed payloads.
    pub async fn post_raw(&self, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request build");

        self.send(request).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => Request::builder()
                .method(method)
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request build"),
            None => Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .expect("request build"),
        };

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body read")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is not JSON")
        };

        (status, json)
    }
}

/// A smooth daily pattern: base load plus a sine wave over 24 hours.
pub fn daily_pattern(hours_ago: i64) -> f64 {
    100.0 + 20.0 * ((hours_ago % 24) as f64 / 24.0 * std::f64::consts::TAU).sin()
}
