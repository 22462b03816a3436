//! Area-weighted basin averages
//!
//! `sum(data * weight) / sum(weight)` over the two spatial dimensions of a
//! layer, giving a scalar for purely spatial layers and a series for layers
//! with one extra (time) dimension. Time steps are reduced in parallel.

use super::SeriesSummary;
use crate::errors::{BasinGridError, Result};
use crate::raster::RasterDataset;
use crate::weights::{check_weight_shape, WeightGrid};
use ndarray::{Array1, Array2, ArrayView2, Axis, Ix2, Ix3, Zip};
use rayon::prelude::*;
use tracing::info;

/// A basin-average time series
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    /// Name of the time dimension
    pub time_name: String,
    /// Raw time coordinates
    pub times: Array1<f64>,
    /// CF units of `times`, if known
    pub time_units: Option<String>,
    pub values: Array1<f64>,
}

impl TimeSeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> SeriesSummary {
        SeriesSummary::from_values(self.values.iter())
    }
}

/// Result of [`basin_average`]
#[derive(Debug, Clone, PartialEq)]
pub enum BasinAverage {
    Scalar(f64),
    Series(TimeSeries),
}

/// Weighted mean of one spatial slice
///
/// NaN data contributes nothing to the numerator; the denominator is always
/// the full weight sum. A slice without any finite weighted value is NaN.
fn weighted_mean(slice: ArrayView2<'_, f32>, weights: &Array2<f64>, total: f64) -> f64 {
    let (sum, any) = Zip::from(slice)
        .and(weights)
        .fold((0.0_f64, false), |(sum, any), &v, &w| {
            if w > 0.0 && v.is_finite() {
                (sum + f64::from(v) * w, true)
            } else {
                (sum, any)
            }
        });
    if any {
        sum / total
    } else {
        f64::NAN
    }
}

/// Basin average of `layer` using `weights`
///
/// # Errors
///
/// Fails with [`BasinGridError::DomainError`] when all weights are zero, and
/// when the layer lacks the weight grid's axes, has mismatching spatial
/// shape, or has more than one non-spatial dimension.
pub fn basin_average(dataset: &RasterDataset, layer: &str, weights: &WeightGrid) -> Result<BasinAverage> {
    let total = weights.weights.sum();
    if total == 0.0 {
        return Err(BasinGridError::DomainError(
            "no grid cells intersect with catchment (all weights are zero)".to_string(),
        ));
    }

    let layer = dataset.layer(layer)?;
    let iy = layer.dim_index(&weights.lat_name).ok_or_else(|| {
        BasinGridError::invalid_axis(&weights.lat_name, format!("not a dimension of '{}'", layer.name))
    })?;
    let ix = layer.dim_index(&weights.lon_name).ok_or_else(|| {
        BasinGridError::invalid_axis(&weights.lon_name, format!("not a dimension of '{}'", layer.name))
    })?;
    check_weight_shape(weights, layer.data.shape()[iy], layer.data.shape()[ix])?;

    let others: Vec<usize> = (0..layer.data.ndim()).filter(|&k| k != iy && k != ix).collect();
    match others.as_slice() {
        [] => {
            let slice = layer
                .data
                .view()
                .permuted_axes(vec![iy, ix])
                .into_dimensionality::<Ix2>()?;
            let value = weighted_mean(slice, &weights.weights, total);
            info!(layer = %layer.name, value, "basin average");
            Ok(BasinAverage::Scalar(value))
        }
        [it] => {
            let time_name = layer.dims[*it].clone();
            let cube = layer
                .data
                .view()
                .permuted_axes(vec![*it, iy, ix])
                .into_dimensionality::<Ix3>()?;
            let values: Vec<f64> = cube
                .axis_iter(Axis(0))
                .into_par_iter()
                .map(|slice| weighted_mean(slice, &weights.weights, total))
                .collect();

            let (times, time_units) = match dataset.axis(&time_name) {
                Some(axis) => (axis.values.clone(), axis.units.clone()),
                None => (Array1::from_iter((0..values.len()).map(|i| i as f64)), None),
            };
            let series = TimeSeries {
                time_name,
                times,
                time_units,
                values: Array1::from(values),
            };
            info!(layer = %layer.name, "basin average series: {}", series.summary());
            Ok(BasinAverage::Series(series))
        }
        _ => Err(BasinGridError::ShapeMismatch {
            what: format!("non-spatial dimensions of '{}'", layer.name),
            expected: vec![1],
            found: vec![others.len()],
        }),
    }
}
