use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    errors::ServiceError, handlers::forecast::validate_confidence_level,
    services::anomalies::AnomalyReport, ApiResponse, AppState,
};

fn default_hours_back() -> i64 {
    24
}

fn default_confidence_level() -> f64 {
    0.95
}

/// Query parameters for anomaly detection
#[derive(Debug, Deserialize, IntoParams)]
pub struct AnomalyQuery {
    /// How many recent hours to analyze (default: 24)
    #[serde(default = "default_hours_back")]
    pub hours_back: i64,
    /// Two-sided confidence level for the band (default: 0.95)
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

/// Detect anomalies in a metric's recent window.
#[utoipa::path(
    post,
    path = "/api/v1/anomalies/{metric_name}",
    params(
        ("metric_name" = String, Path, description = "Metric to analyze"),
        AnomalyQuery
    ),
    responses(
        (status = 200, description = "Analysis complete", body = ApiResponse<AnomalyReport>),
        (status = 400, description = "Invalid parameters", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown metric or insufficient history", body = crate::errors::ErrorResponse),
        (status = 502, description = "Forecasting model failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Anomalies"
)]
pub async fn detect_anomalies(
    State(state): State<AppState>,
    Path(metric_name): Path<String>,
    Query(params): Query<AnomalyQuery>,
) -> Result<Json<ApiResponse<AnomalyReport>>, ServiceError> {
    let max_hours = state.config.max_window_hours;
    if params.hours_back < 1 || params.hours_back > max_hours {
        return Err(ServiceError::ValidationError(format!(
            "hours_back must be between 1 and {}",
            max_hours
        )));
    }
    validate_confidence_level(params.confidence_level)?;

    let report = state
        .services
        .anomalies
        .detect(&metric_name, params.hours_back, params.confidence_level)
        .await?;

    Ok(Json(ApiResponse::success(report)))
}
