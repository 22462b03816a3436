//! Fractional overlap of grid cells with a catchment polygon
//!
//! Each cell is evaluated independently, so the computation runs in
//! parallel over all cells with ndarray's rayon integration.

use crate::catchment::Catchment;
use crate::errors::{BasinGridError, Result};
use crate::geometry::intersection_area;
use crate::grid::Grid;
use crate::raster::RasterDataset;
use geo::{BoundingRect, MultiPolygon, Rect};
use ndarray::{Array1, Array2, Zip};
use tracing::{info, warn};

/// Per-cell catchment coverage over a grid, values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct WeightGrid {
    pub lat_name: String,
    pub lon_name: String,
    pub lat: Array1<f64>,
    pub lon: Array1<f64>,
    /// `weights[[i, j]]` is the covered fraction of the cell at `(lat[i], lon[j])`
    pub weights: Array2<f64>,
    /// Cells with a non-zero weight
    pub nonzero_cells: usize,
    /// Sum of weights, in cell equivalents
    pub effective_cells: f64,
}

impl WeightGrid {
    pub fn shape(&self) -> (usize, usize) {
        self.weights.dim()
    }
}

fn overlaps(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x < b.max().x && b.min().x < a.max().x && a.min().y < b.max().y && b.min().y < a.max().y
}

/// Overlap fraction of every grid cell with `catchment`
///
/// The catchment must be in the grid's coordinate system. Cells outside the
/// catchment's bounding box are zero without an intersection test.
pub fn compute_catchment_weights(grid: &Grid, catchment: &MultiPolygon<f64>) -> WeightGrid {
    let (rows, cols) = grid.shape();
    info!(
        lat_res = grid.lat_res,
        lon_res = grid.lon_res,
        "grid resolution: ~{:.4} lat x {:.4} lon",
        grid.lat_res,
        grid.lon_res
    );

    let mut weights = Array2::<f64>::zeros((rows, cols));
    let cell_area = grid.cell_area();

    if let (Some(bbox), true) = (catchment.bounding_rect(), cell_area > 0.0) {
        Zip::indexed(&mut weights).par_for_each(|(i, j), w| {
            let cell = grid.cell_rect(i, j);
            if overlaps(&cell, &bbox) {
                *w = (intersection_area(catchment, &cell) / cell_area).clamp(0.0, 1.0);
            }
        });
    }

    let nonzero_cells = weights.iter().filter(|&&w| w > 0.0).count();
    let effective_cells = weights.sum();
    info!(
        "grid cells intersecting catchment: {}/{}",
        nonzero_cells,
        weights.len()
    );
    info!("total weight (sum of fractions): {effective_cells:.2} cells equivalent");

    WeightGrid {
        lat_name: grid.lat_name.clone(),
        lon_name: grid.lon_name.clone(),
        lat: grid.lat.clone(),
        lon: grid.lon.clone(),
        weights,
        nonzero_cells,
        effective_cells,
    }
}

/// Weights for a dataset's spatial grid
///
/// The catchment is reprojected to the dataset CRS when both are known and
/// differ.
pub fn compute_dataset_weights(dataset: &RasterDataset, catchment: &Catchment) -> Result<WeightGrid> {
    let grid = Grid::from_dataset(dataset)?;
    let catchment = match dataset.crs() {
        Some(crs) if crs != catchment.crs() => catchment.reproject(crs)?,
        _ => catchment.clone(),
    };
    let weights = compute_catchment_weights(&grid, catchment.geometry());
    if weights.nonzero_cells == 0 {
        warn!("catchment does not intersect any grid cell");
    }
    Ok(weights)
}

/// Check that `weights` matches the dataset's spatial axes
pub(crate) fn check_weight_shape(weights: &WeightGrid, rows: usize, cols: usize) -> Result<()> {
    if weights.shape() != (rows, cols) {
        return Err(BasinGridError::ShapeMismatch {
            what: "weight grid".to_string(),
            expected: vec![rows, cols],
            found: vec![weights.shape().0, weights.shape().1],
        });
    }
    Ok(())
}
