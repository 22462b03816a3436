//! NaN-skipping summary statistics for 1-D series

use serde::Serialize;
use std::fmt;

/// Count, mean, extrema and population standard deviation of the finite values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl SeriesSummary {
    /// Summarize `values`, ignoring NaN and infinite entries
    ///
    /// With no finite values every statistic is NaN and `count` is 0.
    #[must_use]
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let finite: Vec<f64> = values.into_iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Self {
                count: 0,
                mean: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                std: f64::NAN,
            };
        }

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            count: finite.len(),
            mean,
            min: finite.iter().copied().fold(f64::INFINITY, f64::min),
            max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std: variance.sqrt(),
        }
    }
}

impl fmt::Display for SeriesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} mean={:.4} min={:.4} max={:.4} std={:.4}",
            self.count, self.mean, self.min, self.max, self.std
        )
    }
}
