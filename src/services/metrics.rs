use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    entities::metric_sample::{self, Column, Entity as MetricSampleEntity},
    errors::ServiceError,
};

/// Summary of one stored metric series.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricSummary {
    /// Metric name as stored
    pub name: String,
    /// Number of stored samples
    pub sample_count: i64,
    /// Timestamp of the newest sample
    pub latest_at: DateTime<Utc>,
}

/// A sample to be recorded for a metric.
#[derive(Debug, Clone, Copy)]
pub struct NewSample {
    pub recorded_at: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, FromQueryResult)]
struct MetricSummaryRow {
    metric_name: String,
    sample_count: i64,
    latest_at: DateTime<Utc>,
}

/// Read/write access to the metric sample store. All reads are single
/// parameterized queries over the (metric_name, recorded_at) index.
#[derive(Clone)]
pub struct MetricStoreService {
    db: Arc<DatabaseConnection>,
}

impl MetricStoreService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Distinct metric names with sample counts, ordered by name.
    pub async fn list_metrics(&self) -> Result<Vec<MetricSummary>, ServiceError> {
        let rows = MetricSampleEntity::find()
            .select_only()
            .column(Column::MetricName)
            .column_as(Column::Id.count(), "sample_count")
            .column_as(Column::RecordedAt.max(), "latest_at")
            .group_by(Column::MetricName)
            .order_by_asc(Column::MetricName)
            .into_model::<MetricSummaryRow>()
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| MetricSummary {
                name: row.metric_name,
                sample_count: row.sample_count,
                latest_at: row.latest_at,
            })
            .collect())
    }

    /// Whether any samples exist for the metric.
    pub async fn metric_exists(&self, metric_name: &str) -> Result<bool, ServiceError> {
        let found = MetricSampleEntity::find()
            .filter(Column::MetricName.eq(metric_name))
            .limit(1)
            .one(&*self.db)
            .await?;
        Ok(found.is_some())
    }

    /// Samples for a metric within the last `hours_back` hours, ascending.
    pub async fn fetch_series(
        &self,
        metric_name: &str,
        hours_back: i64,
    ) -> Result<Vec<metric_sample::Model>, ServiceError> {
        let cutoff = Utc::now() - Duration::hours(hours_back);
        let samples = MetricSampleEntity::find()
            .filter(Column::MetricName.eq(metric_name))
            .filter(Column::RecordedAt.gte(cutoff))
            .order_by_asc(Column::RecordedAt)
            .all(&*self.db)
            .await?;

        debug!(
            metric = metric_name,
            hours_back,
            samples = samples.len(),
            "Fetched metric series"
        );
        Ok(samples)
    }

    /// Bulk-insert observed samples for a metric.
    pub async fn record_samples(
        &self,
        metric_name: &str,
        samples: Vec<NewSample>,
    ) -> Result<u64, ServiceError> {
        if samples.is_empty() {
            return Err(ServiceError::InvalidInput(
                "at least one sample is required".to_string(),
            ));
        }

        let count = samples.len() as u64;
        let models = samples
            .into_iter()
            .map(|s| metric_sample::ActiveModel {
                metric_name: Set(metric_name.to_string()),
                recorded_at: Set(s.recorded_at),
                value: Set(s.value),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        MetricSampleEntity::insert_many(models)
            .exec(&*self.db)
            .await?;

        debug!(metric = metric_name, count, "Recorded metric samples");
        Ok(count)
    }
}
