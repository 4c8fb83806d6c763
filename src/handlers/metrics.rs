use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    errors::ServiceError,
    services::metrics::{MetricSummary, NewSample},
    ApiResponse, AppState,
};

/// One observed sample in an ingestion batch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SampleInput {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Bulk sample ingestion request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordSamplesRequest {
    #[validate(length(min = 1, max = 10000))]
    pub samples: Vec<SampleInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordSamplesResponse {
    pub metric: String,
    pub recorded: u64,
}

/// List the metrics available for forecasting.
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    responses(
        (status = 200, description = "Available metrics", body = ApiResponse<Vec<MetricSummary>>)
    ),
    tag = "Metrics"
)]
pub async fn list_metrics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MetricSummary>>>, ServiceError> {
    let metrics = state.services.store.list_metrics().await?;
    Ok(Json(ApiResponse::success(metrics)))
}

/// Record observed samples for a metric.
#[utoipa::path(
    post,
    path = "/api/v1/metrics/{metric_name}/samples",
    request_body = RecordSamplesRequest,
    params(
        ("metric_name" = String, Path, description = "Metric to record samples for")
    ),
    responses(
        (status = 201, description = "Samples recorded", body = ApiResponse<RecordSamplesResponse>),
        (status = 400, description = "Invalid batch", body = crate::errors::ErrorResponse)
    ),
    tag = "Metrics"
)]
pub async fn record_samples(
    State(state): State<AppState>,
    Path(metric_name): Path<String>,
    Json(request): Json<RecordSamplesRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecordSamplesResponse>>), ServiceError> {
    request.validate()?;

    if metric_name.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "metric name must not be empty".to_string(),
        ));
    }

    let samples: Vec<NewSample> = request
        .samples
        .iter()
        .map(|s| NewSample {
            recorded_at: s.timestamp,
            value: s.value,
        })
        .collect();

    let recorded = state
        .services
        .store
        .record_samples(&metric_name, samples)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RecordSamplesResponse {
            metric: metric_name,
            recorded,
        })),
    ))
}
