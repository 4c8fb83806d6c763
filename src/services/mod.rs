pub mod anomalies;
pub mod forecasting;
pub mod metrics;
