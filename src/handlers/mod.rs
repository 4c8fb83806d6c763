pub mod anomalies;
pub mod forecast;
pub mod health;
pub mod metrics;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        anomalies::AnomalyService, forecasting::ForecastService, metrics::MetricStoreService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates the orchestration logic used by HTTP
/// handlers.
#[derive(Clone)]
pub struct AppServices {
    pub store: MetricStoreService,
    pub forecasting: ForecastService,
    pub anomalies: AnomalyService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, cfg: &AppConfig) -> Self {
        let store = MetricStoreService::new(db);
        let forecasting = ForecastService::new(store.clone(), cfg);
        let anomalies = AnomalyService::new(forecasting.clone());

        Self {
            store,
            forecasting,
            anomalies,
        }
    }
}
