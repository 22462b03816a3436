//! Regular lat/lon grids derived from raster coordinate axes

use crate::errors::{BasinGridError, Result};
use crate::raster::{AxisKind, RasterDataset};
use geo::{Coord, Rect};
use ndarray::Array1;
use tracing::debug;

/// Resolution assumed for single-sample axes
pub const DEFAULT_RESOLUTION: f64 = 0.1;

/// Step of a coordinate axis from its first two samples
///
/// Regular spacing is assumed, not checked. Axes with fewer than two
/// samples return `default`.
pub fn grid_resolution(axis: &[f64], default: f64) -> f64 {
    match axis {
        [first, second, ..] => (second - first).abs(),
        _ => default,
    }
}

/// Require finite, strictly monotonic coordinates
pub fn check_axis(name: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(BasinGridError::invalid_axis(name, "axis is empty"));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(BasinGridError::invalid_axis(
            name,
            format!("non-finite coordinate {bad}"),
        ));
    }
    let ascending = values.windows(2).all(|w| w[1] > w[0]);
    let descending = values.windows(2).all(|w| w[1] < w[0]);
    if !(ascending || descending) {
        return Err(BasinGridError::invalid_axis(
            name,
            "coordinates are not strictly monotonic",
        ));
    }
    Ok(())
}

/// Two spatial axes and their estimated resolutions
///
/// Rows follow the latitude-like axis, columns the longitude-like one.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub lat_name: String,
    pub lon_name: String,
    pub lat: Array1<f64>,
    pub lon: Array1<f64>,
    pub lat_res: f64,
    pub lon_res: f64,
}

impl Grid {
    /// Grid with the default `lat`/`lon` axis names
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Result<Self> {
        Self::with_names("lat", lat, "lon", lon)
    }

    pub fn with_names(
        lat_name: impl Into<String>,
        lat: Vec<f64>,
        lon_name: impl Into<String>,
        lon: Vec<f64>,
    ) -> Result<Self> {
        let (lat_name, lon_name) = (lat_name.into(), lon_name.into());
        check_axis(&lat_name, &lat)?;
        check_axis(&lon_name, &lon)?;

        let lat_res = grid_resolution(&lat, DEFAULT_RESOLUTION);
        let lon_res = grid_resolution(&lon, DEFAULT_RESOLUTION);
        debug!(lat_res, lon_res, rows = lat.len(), cols = lon.len(), "grid");

        Ok(Self {
            lat_name,
            lon_name,
            lat: Array1::from(lat),
            lon: Array1::from(lon),
            lat_res,
            lon_res,
        })
    }

    /// Grid over the dataset's Y and X axes, found by synonym
    pub fn from_dataset(dataset: &RasterDataset) -> Result<Self> {
        let lat = dataset.require_axis(AxisKind::Y)?;
        let lon = dataset.require_axis(AxisKind::X)?;
        Self::with_names(
            lat.name.clone(),
            lat.to_vec(),
            lon.name.clone(),
            lon.to_vec(),
        )
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    pub fn len(&self) -> usize {
        self.lat.len() * self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell box centred on `(lon[j], lat[i])`
    pub fn cell_rect(&self, i: usize, j: usize) -> Rect<f64> {
        let (cx, cy) = (self.lon[j], self.lat[i]);
        let (hx, hy) = (self.lon_res / 2.0, self.lat_res / 2.0);
        Rect::new(
            Coord { x: cx - hx, y: cy - hy },
            Coord { x: cx + hx, y: cy + hy },
        )
    }

    /// Area of one cell in squared axis units
    pub fn cell_area(&self) -> f64 {
        self.lon_res * self.lat_res
    }
}
