//! Anomalies of a basin-average series against its temporal mean

use super::{SeriesSummary, TimeSeries};
use crate::errors::{BasinGridError, Result};
use ndarray::Array1;
use serde::Serialize;
use tracing::info;

/// Fixed-key anomaly diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyStats {
    pub mean: f64,
    pub std: f64,
    pub max_positive: f64,
    pub max_negative: f64,
}

impl AnomalyStats {
    /// `(mean, std, max_positive, max_negative)`
    #[must_use]
    pub const fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.mean, self.std, self.max_positive, self.max_negative)
    }
}

/// Anomaly series with its diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Anomalies {
    pub anomalies: Array1<f64>,
    pub stats: AnomalyStats,
}

/// `value - temporal mean` for every step of `series`
///
/// `max_positive` and `max_negative` are the largest and smallest anomaly.
/// NaN steps stay NaN and are ignored by the statistics.
///
/// # Errors
///
/// Fails when `time_dim` does not name the series' time dimension.
pub fn compute_anomalies(series: &TimeSeries, time_dim: &str) -> Result<Anomalies> {
    if series.time_name != time_dim {
        return Err(BasinGridError::invalid_axis(
            time_dim,
            format!("series is indexed by '{}'", series.time_name),
        ));
    }

    let temporal_mean = series.summary().mean;
    let anomalies = series.values.mapv(|v| v - temporal_mean);
    let summary = SeriesSummary::from_values(anomalies.iter());
    let stats = AnomalyStats {
        mean: summary.mean,
        std: summary.std,
        max_positive: summary.max,
        max_negative: summary.min,
    };

    info!("computed anomalies:");
    info!("  - mean anomaly: {:.4}", stats.mean);
    info!("  - std anomaly: {:.4}", stats.std);
    info!("  - max positive anomaly: {:.4}", stats.max_positive);
    info!("  - max negative anomaly: {:.4}", stats.max_negative);

    Ok(Anomalies { anomalies, stats })
}
