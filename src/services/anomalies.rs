use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{errors::ServiceError, services::forecasting::ForecastService};

const SIGMA_FLOOR: f64 = 1e-9;

/// How far outside the confidence band an observation sits, in residual
/// standard deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    fn from_score(score: f64) -> Self {
        if score >= 3.0 {
            Severity::High
        } else if score >= 2.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// One observed value flagged as falling outside the model's confidence band.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnomalyPoint {
    pub timestamp: DateTime<Utc>,
    pub actual_value: f64,
    pub predicted_value: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// |actual - predicted| / residual sigma
    pub deviation_score: f64,
    pub severity: Severity,
}

/// Result of analyzing one metric's recent window.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnomalyReport {
    pub metric: String,
    pub period_analyzed_hours: i64,
    pub anomalies_detected: usize,
    pub anomalies: Vec<AnomalyPoint>,
    pub analysis_timestamp: DateTime<Utc>,
}

/// Flags recent observed values that fall outside the model's in-sample
/// confidence band. The model is refit per request over the training window
/// plus the analysis window; there is no forecast cache.
#[derive(Clone)]
pub struct AnomalyService {
    forecasts: ForecastService,
}

impl AnomalyService {
    pub fn new(forecasts: ForecastService) -> Self {
        Self { forecasts }
    }

    pub async fn detect(
        &self,
        metric_name: &str,
        hours_back: i64,
        confidence_level: f64,
    ) -> Result<AnomalyReport, ServiceError> {
        let series = self
            .forecasts
            .training_series(metric_name, hours_back)
            .await?;
        // Horizon 1: only the in-sample band is used here
        let run = self
            .forecasts
            .run_model(series.clone(), 1, confidence_level)
            .await?;

        let cutoff = Utc::now() - Duration::hours(hours_back);
        let sigma = run.residual_sigma.max(SIGMA_FLOOR);

        let anomalies: Vec<AnomalyPoint> = series
            .iter()
            .zip(run.in_sample.iter())
            .filter(|(observed, _)| observed.timestamp >= cutoff)
            .filter(|(observed, band)| {
                observed.value < band.lower || observed.value > band.upper
            })
            .map(|(observed, band)| {
                let score = (observed.value - band.predicted).abs() / sigma;
                AnomalyPoint {
                    timestamp: observed.timestamp,
                    actual_value: observed.value,
                    predicted_value: band.predicted,
                    lower_bound: band.lower,
                    upper_bound: band.upper,
                    deviation_score: score,
                    severity: Severity::from_score(score),
                }
            })
            .collect();

        info!(
            metric = metric_name,
            hours_back,
            anomalies = anomalies.len(),
            "Anomaly analysis complete"
        );

        Ok(AnomalyReport {
            metric: metric_name.to_string(),
            period_analyzed_hours: hours_back,
            anomalies_detected: anomalies.len(),
            anomalies,
            analysis_timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_bands() {
        assert_eq!(Severity::from_score(0.5), Severity::Low);
        assert_eq!(Severity::from_score(2.0), Severity::Medium);
        assert_eq!(Severity::from_score(2.9), Severity::Medium);
        assert_eq!(Severity::from_score(3.0), Severity::High);
        assert_eq!(Severity::from_score(10.0), Severity::High);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::High).unwrap(),
            "\"high\""
        );
    }
}
