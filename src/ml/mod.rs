//! Wrapper around the external forecasting model.
//!
//! The actual forecasting math (trend/seasonality decomposition and
//! confidence-interval generation) is delegated to `augurs`: an MSTL
//! decomposition over an AutoETS trend model. This module owns the
//! input/output contract around it: bucketing raw samples into a regular
//! hourly series, running fit/predict, and deriving residual statistics
//! (sigma, accuracy, scalar anomaly thresholds) from the in-sample fit.

use augurs::ets::trend::AutoETSTrendModel;
use augurs::ets::AutoETS;
use augurs::mstl::MSTLModel;
use augurs::prelude::*;
use chrono::{DateTime, Duration, DurationRound, Utc};
use statrs::distribution::{ContinuousCDF, Normal};

/// One bucket of a regular hourly series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A predicted value with its confidence band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPoint {
    pub timestamp: DateTime<Utc>,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Output of one model run: in-sample band, future band, residual statistics.
#[derive(Debug, Clone)]
pub struct ModelRun {
    /// Confidence band over the training window, one point per hourly bucket
    pub in_sample: Vec<BandPoint>,
    /// Confidence band over the requested horizon
    pub forecast: Vec<BandPoint>,
    /// Standard deviation of in-sample residuals (observed - predicted)
    pub residual_sigma: f64,
    /// 1 - MAPE over the in-sample fit, clamped to [0, 1]
    pub accuracy: f64,
    /// Mean of the training series
    pub series_mean: f64,
    /// Confidence level the bands were generated at
    pub confidence_level: f64,
}

impl ModelRun {
    /// Scalar anomaly thresholds derived from the residual distribution:
    /// series mean +/- z(level) * sigma.
    pub fn anomaly_thresholds(&self) -> (f64, f64) {
        let z = normal_quantile(self.confidence_level);
        (
            self.series_mean - z * self.residual_sigma,
            self.series_mean + z * self.residual_sigma,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("series is empty")]
    EmptySeries,
    #[error("model fit failed: {0}")]
    Fit(String),
    #[error("model predict failed: {0}")]
    Predict(String),
}

/// Seasonal forecasting model with a fixed season length (hourly buckets per
/// cycle; 24 for daily seasonality).
#[derive(Debug, Clone, Copy)]
pub struct SeasonalModel {
    season_length: usize,
}

impl SeasonalModel {
    pub fn new(season_length: usize) -> Self {
        Self { season_length }
    }

    /// Fit the model on a regular hourly series and predict `horizon` hours
    /// ahead at the given confidence level.
    ///
    /// This is a blocking, CPU-bound call; callers on the async runtime must
    /// offload it with `tokio::task::spawn_blocking`.
    pub fn run(
        &self,
        series: &[HourlyPoint],
        horizon: usize,
        confidence_level: f64,
    ) -> Result<ModelRun, ModelError> {
        let last = series.last().ok_or(ModelError::EmptySeries)?;
        let y: Vec<f64> = series.iter().map(|p| p.value).collect();

        let trend = AutoETSTrendModel::from(AutoETS::non_seasonal());
        let model = MSTLModel::new(vec![self.season_length], trend);
        let fit = model.fit(&y).map_err(|e| ModelError::Fit(e.to_string()))?;

        let in_sample_forecast = fit
            .predict_in_sample(confidence_level)
            .map_err(|e| ModelError::Predict(e.to_string()))?;
        let future_forecast = fit
            .predict(horizon, confidence_level)
            .map_err(|e| ModelError::Predict(e.to_string()))?;

        let residual_sigma = residual_sigma(&y, &in_sample_forecast.point);
        let accuracy = accuracy(&y, &in_sample_forecast.point);
        let series_mean = mean(&y);

        let z = normal_quantile(confidence_level);
        let fallback_band = z * residual_sigma;

        let in_sample = band_points(
            series.iter().map(|p| p.timestamp),
            &in_sample_forecast,
            fallback_band,
        );
        let forecast = band_points(
            (1..=horizon as i64).map(|i| last.timestamp + Duration::hours(i)),
            &future_forecast,
            fallback_band,
        );

        Ok(ModelRun {
            in_sample,
            forecast,
            residual_sigma,
            accuracy,
            series_mean,
            confidence_level,
        })
    }
}

fn band_points(
    timestamps: impl Iterator<Item = DateTime<Utc>>,
    forecast: &augurs::Forecast,
    fallback_band: f64,
) -> Vec<BandPoint> {
    timestamps
        .zip(forecast.point.iter())
        .enumerate()
        .map(|(i, (timestamp, &predicted))| {
            let (lower, upper) = match &forecast.intervals {
                Some(intervals) => (intervals.lower[i], intervals.upper[i]),
                // The trend model may omit intervals; fall back to the
                // residual-derived band
                None => (predicted - fallback_band, predicted + fallback_band),
            };
            BandPoint {
                timestamp,
                predicted,
                lower,
                upper,
            }
        })
        .collect()
}

/// Collapse raw (timestamp, value) samples into a regular hourly series.
///
/// Samples within the same hour are averaged; interior gaps carry the previous
/// bucket's value forward so the model sees a regular grid.
pub fn hourly_buckets(samples: &[(DateTime<Utc>, f64)]) -> Vec<HourlyPoint> {
    let mut buckets: Vec<(DateTime<Utc>, f64, u32)> = Vec::new();

    for &(ts, value) in samples {
        let Ok(hour) = ts.duration_trunc(Duration::hours(1)) else {
            continue;
        };
        match buckets.last_mut() {
            Some((bucket_ts, sum, count)) if *bucket_ts == hour => {
                *sum += value;
                *count += 1;
            }
            _ => buckets.push((hour, value, 1)),
        }
    }

    let mut series: Vec<HourlyPoint> = Vec::with_capacity(buckets.len());
    for (hour, sum, count) in buckets {
        let value = sum / f64::from(count);
        if let Some(prev) = series.last().copied() {
            // Fill interior gaps so the series stays regular
            let mut next = prev.timestamp + Duration::hours(1);
            while next < hour {
                series.push(HourlyPoint {
                    timestamp: next,
                    value: prev.value,
                });
                next += Duration::hours(1);
            }
        }
        series.push(HourlyPoint {
            timestamp: hour,
            value,
        });
    }

    series
}

/// Standard deviation of in-sample residuals.
pub(crate) fn residual_sigma(actual: &[f64], predicted: &[f64]) -> f64 {
    let residuals: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .map(|(y, yhat)| y - yhat)
        .collect();
    if residuals.is_empty() {
        return 0.0;
    }
    let mean = mean(&residuals);
    let var = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / residuals.len() as f64;
    var.sqrt()
}

/// 1 - MAPE over the in-sample fit, clamped to [0, 1]. Zero actuals are
/// skipped; a series of only zeros scores 0.
pub(crate) fn accuracy(actual: &[f64], predicted: &[f64]) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for (y, yhat) in actual.iter().zip(predicted.iter()) {
        if y.abs() > f64::EPSILON {
            total += ((y - yhat) / y).abs();
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    (1.0 - total / count as f64).clamp(0.0, 1.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// z-score for a two-sided confidence level (e.g. 0.95 -> ~1.96).
pub(crate) fn normal_quantile(confidence_level: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(0.5 + confidence_level / 2.0))
        .unwrap_or(1.96)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i)
    }

    fn seasonal_series(hours: i64) -> Vec<HourlyPoint> {
        (0..hours)
            .map(|i| HourlyPoint {
                timestamp: hour(i),
                value: 100.0 + 20.0 * ((i % 24) as f64 / 24.0 * std::f64::consts::TAU).sin(),
            })
            .collect()
    }

    #[test]
    fn accuracy_matches_mape_complement() {
        let actual = vec![100.0, 200.0, 400.0];
        let predicted = vec![95.0, 190.0, 380.0];
        let acc = accuracy(&actual, &predicted);
        assert!((acc - 0.95).abs() < 1e-9);
    }

    #[test]
    fn accuracy_skips_zero_actuals() {
        let actual = vec![0.0, 100.0];
        let predicted = vec![5.0, 90.0];
        let acc = accuracy(&actual, &predicted);
        assert!((acc - 0.9).abs() < 1e-9);
    }

    #[test]
    fn residual_sigma_of_perfect_fit_is_zero() {
        let y = vec![1.0, 2.0, 3.0];
        assert_eq!(residual_sigma(&y, &y), 0.0);
    }

    #[test]
    fn normal_quantile_covers_common_levels() {
        assert!((normal_quantile(0.95) - 1.96).abs() < 0.01);
        assert!((normal_quantile(0.99) - 2.576).abs() < 0.01);
    }

    #[test]
    fn hourly_buckets_averages_and_fills_gaps() {
        let samples = vec![
            (hour(0), 10.0),
            (hour(0) + Duration::minutes(30), 20.0),
            // hour 1 missing entirely
            (hour(2), 40.0),
        ];
        let series = hourly_buckets(&samples);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].value, 15.0);
        assert_eq!(series[1].timestamp, hour(1));
        assert_eq!(series[1].value, 15.0); // carried forward
        assert_eq!(series[2].value, 40.0);
    }

    #[test]
    fn model_run_produces_bands_and_future_timestamps() {
        let series = seasonal_series(336);
        let model = SeasonalModel::new(24);
        let run = model.run(&series, 24, 0.95).expect("model should fit");

        assert_eq!(run.in_sample.len(), series.len());
        assert_eq!(run.forecast.len(), 24);
        assert_eq!(run.forecast[0].timestamp, hour(336));
        assert_eq!(run.forecast[23].timestamp, hour(359));

        for p in run.in_sample.iter().chain(run.forecast.iter()) {
            assert!(p.lower <= p.predicted && p.predicted <= p.upper);
        }

        // Clean seasonal data should fit well
        assert!(run.accuracy > 0.5, "accuracy was {}", run.accuracy);

        let (lo, hi) = run.anomaly_thresholds();
        assert!(lo < run.series_mean && run.series_mean < hi);
    }

    #[test]
    fn empty_series_is_rejected() {
        let model = SeasonalModel::new(24);
        assert!(matches!(
            model.run(&[], 24, 0.95),
            Err(ModelError::EmptySeries)
        ));
    }
}
