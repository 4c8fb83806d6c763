use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    errors::ServiceError,
    ml::{hourly_buckets, HourlyPoint, ModelRun, SeasonalModel},
    services::metrics::MetricStoreService,
};

/// A predicted value with upper/lower confidence bounds at a future timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub predicted_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Full forecast for one metric.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForecastResponse {
    pub metric: String,
    pub forecast_points: Vec<ForecastPoint>,
    /// Observed values above this are anomalous (series mean + z * sigma)
    pub anomaly_threshold_upper: f64,
    /// Observed values below this are anomalous (series mean - z * sigma)
    pub anomaly_threshold_lower: f64,
    /// 1 - MAPE of the model's in-sample fit, in [0, 1]
    pub model_accuracy: f64,
    pub last_updated: DateTime<Utc>,
}

/// Orchestrates the forecast flow: fetch history, shape it for the model,
/// offload the blocking fit, and map the model's output onto the response
/// contract.
#[derive(Clone)]
pub struct ForecastService {
    store: MetricStoreService,
    model: SeasonalModel,
    training_window_hours: i64,
    min_training_hours: usize,
}

impl ForecastService {
    pub fn new(store: MetricStoreService, cfg: &AppConfig) -> Self {
        Self {
            store,
            model: SeasonalModel::new(cfg.season_length_hours),
            training_window_hours: cfg.training_window_hours,
            min_training_hours: cfg.min_training_hours,
        }
    }

    /// Forecast `hours_ahead` hours for a metric at the given confidence level.
    pub async fn forecast(
        &self,
        metric_name: &str,
        hours_ahead: usize,
        confidence_level: f64,
    ) -> Result<ForecastResponse, ServiceError> {
        let series = self.training_series(metric_name, 0).await?;
        let run = self
            .run_model(series, hours_ahead, confidence_level)
            .await?;

        let (threshold_lower, threshold_upper) = run.anomaly_thresholds();

        info!(
            metric = metric_name,
            hours_ahead,
            accuracy = run.accuracy,
            "Forecast generated"
        );

        Ok(ForecastResponse {
            metric: metric_name.to_string(),
            forecast_points: run
                .forecast
                .iter()
                .map(|p| ForecastPoint {
                    timestamp: p.timestamp,
                    predicted_value: p.predicted,
                    lower_bound: p.lower,
                    upper_bound: p.upper,
                })
                .collect(),
            anomaly_threshold_upper: threshold_upper,
            anomaly_threshold_lower: threshold_lower,
            model_accuracy: run.accuracy,
            last_updated: Utc::now(),
        })
    }

    /// Fetch and validate the training series for a metric, optionally
    /// extended by `extra_hours` (used by anomaly detection to cover the
    /// analysis window).
    pub(crate) async fn training_series(
        &self,
        metric_name: &str,
        extra_hours: i64,
    ) -> Result<Vec<HourlyPoint>, ServiceError> {
        if !self.store.metric_exists(metric_name).await? {
            return Err(ServiceError::NotFound(format!(
                "Metric {} not found",
                metric_name
            )));
        }

        let samples = self
            .store
            .fetch_series(metric_name, self.training_window_hours + extra_hours)
            .await?;
        if samples.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No historical data found for metric {}",
                metric_name
            )));
        }

        let points: Vec<(DateTime<Utc>, f64)> = samples
            .iter()
            .map(|s| (s.recorded_at, s.value))
            .collect();
        let series = hourly_buckets(&points);

        if series.len() < self.min_training_hours {
            return Err(ServiceError::NotFound(format!(
                "Not enough historical data for metric {}: {} hourly buckets, {} required",
                metric_name,
                series.len(),
                self.min_training_hours
            )));
        }

        debug!(
            metric = metric_name,
            buckets = series.len(),
            "Prepared training series"
        );
        Ok(series)
    }

    /// Run the blocking model fit on a worker thread.
    pub(crate) async fn run_model(
        &self,
        series: Vec<HourlyPoint>,
        horizon: usize,
        confidence_level: f64,
    ) -> Result<ModelRun, ServiceError> {
        let model = self.model;
        tokio::task::spawn_blocking(move || model.run(&series, horizon, confidence_level))
            .await
            .map_err(|e| ServiceError::InternalError(format!("model task failed: {}", e)))?
            .map_err(|e| ServiceError::ModelError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::metrics::MetricStoreService;
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    async fn service() -> ForecastService {
        let db = sea_orm::Database::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        let cfg = crate::config::AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            8000,
            "test".to_string(),
        );
        ForecastService::new(MetricStoreService::new(Arc::new(db)), &cfg)
    }

    fn corrupt_series(hours: i64) -> Vec<HourlyPoint> {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        (0..hours)
            .map(|i| HourlyPoint {
                timestamp: start + Duration::hours(i),
                value: if i == 50 { f64::NAN } else { 100.0 },
            })
            .collect()
    }

    #[tokio::test]
    async fn model_failures_surface_as_bad_gateway() {
        let svc = service().await;

        let err = svc
            .run_model(corrupt_series(200), 24, 0.95)
            .await
            .expect_err("fit on corrupt data should fail");
        assert!(matches!(err, ServiceError::ModelError(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body read");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("body is JSON");
        assert!(body["message"]
            .as_str()
            .expect("message present")
            .contains("Forecasting failed"));
    }
}
