use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Forecast API",
        version = "1.0.0",
        description = r#"
# Metric Forecasting API

Time-series forecasting and anomaly detection for server metrics.

## Features

- **Forecasting**: Seasonality-aware forecasts with confidence bands,
  delegated to an MSTL/AutoETS model
- **Anomaly Detection**: Flags observed values outside the model's
  confidence band, with residual-based severity scores
- **Metric Catalog**: Lists stored metric series and accepts sample ingestion

## Error Handling

The API uses consistent error response formats with appropriate HTTP status
codes:

```json
{
  "error": "Not Found",
  "message": "Metric cpu_usage_percent not found",
  "request_id": "req-abc123xyz",
  "timestamp": "2026-08-26T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development")
    ),
    tags(
        (name = "Metrics", description = "Metric catalog and ingestion endpoints"),
        (name = "Forecasting", description = "Forecast generation endpoints"),
        (name = "Anomalies", description = "Anomaly detection endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::metrics::list_metrics,
        crate::handlers::metrics::record_samples,
        crate::handlers::forecast::forecast_metric,
        crate::handlers::anomalies::detect_anomalies,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,

            crate::handlers::metrics::SampleInput,
            crate::handlers::metrics::RecordSamplesRequest,
            crate::handlers::metrics::RecordSamplesResponse,
            crate::handlers::forecast::ForecastRequest,

            crate::services::metrics::MetricSummary,
            crate::services::forecasting::ForecastPoint,
            crate::services::forecasting::ForecastResponse,
            crate::services::anomalies::AnomalyPoint,
            crate::services::anomalies::AnomalyReport,
            crate::services::anomalies::Severity,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
