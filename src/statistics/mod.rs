//! Area-weighted reductions over a catchment
//!
//! # Organization
//!
//! - [`basin`]: basin averages from a weight grid
//! - [`anomaly`]: anomalies against the temporal mean
//! - [`summary`]: NaN-skipping series statistics

pub mod anomaly;
pub mod basin;
pub mod summary;

pub use anomaly::{compute_anomalies, Anomalies, AnomalyStats};
pub use basin::{basin_average, BasinAverage, TimeSeries};
pub use summary::SeriesSummary;
