use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError, services::forecasting::ForecastResponse, ApiResponse, AppState,
};

fn default_hours_ahead() -> i64 {
    24
}

fn default_confidence_level() -> f64 {
    0.95
}

/// Forecast request body. All fields are optional; an empty body uses the
/// defaults.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ForecastRequest {
    /// How many hours to forecast ahead
    #[serde(default = "default_hours_ahead")]
    pub hours_ahead: i64,
    /// Two-sided confidence level for the prediction bands
    #[serde(default = "default_confidence_level", alias = "confidence_interval")]
    pub confidence_level: f64,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            hours_ahead: default_hours_ahead(),
            confidence_level: default_confidence_level(),
        }
    }
}

pub(crate) fn validate_confidence_level(level: f64) -> Result<(), ServiceError> {
    if !(0.5..=0.99).contains(&level) {
        return Err(ServiceError::ValidationError(
            "confidence_level must be between 0.5 and 0.99".to_string(),
        ));
    }
    Ok(())
}

/// Generate a forecast for a metric.
#[utoipa::path(
    post,
    path = "/api/v1/forecast/{metric_name}",
    request_body(content = ForecastRequest, description = "Forecast parameters (optional)"),
    params(
        ("metric_name" = String, Path, description = "Metric to forecast")
    ),
    responses(
        (status = 200, description = "Forecast generated", body = ApiResponse<ForecastResponse>),
        (status = 400, description = "Invalid parameters", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown metric or insufficient history", body = crate::errors::ErrorResponse),
        (status = 502, description = "Forecasting model failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Forecasting"
)]
pub async fn forecast_metric(
    State(state): State<AppState>,
    Path(metric_name): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<ForecastResponse>>, ServiceError> {
    // An absent body means defaults; a present body must parse
    let request = if body.is_empty() {
        ForecastRequest::default()
    } else {
        serde_json::from_slice::<ForecastRequest>(&body)
            .map_err(|e| ServiceError::BadRequest(format!("invalid request body: {}", e)))?
    };

    let max_hours = state.config.max_window_hours;
    if request.hours_ahead < 1 || request.hours_ahead > max_hours {
        return Err(ServiceError::ValidationError(format!(
            "hours_ahead must be between 1 and {}",
            max_hours
        )));
    }
    validate_confidence_level(request.confidence_level)?;

    let forecast = state
        .services
        .forecasting
        .forecast(
            &metric_name,
            request.hours_ahead as usize,
            request.confidence_level,
        )
        .await?;

    Ok(Json(ApiResponse::success(forecast)))
}
