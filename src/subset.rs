//! Spatial subsetting of raster datasets to a catchment
//!
//! Selection runs through up to three strategies:
//!
//! 1. optional exact clip: cells the catchment does not touch are masked
//!    with NaN and the grid is cropped to the touched rows and columns;
//! 2. an inclusive range selection on each spatial axis, with the bounds
//!    buffered by a number of grid cells;
//! 3. when 2 leaves an axis empty, a small window centred on the bounds.
//!
//! If the window is empty too the dataset comes back unchanged with
//! [`SubsetOutcome::NoOp`]. Degraded selections are never errors. Only
//! malformed axes (non-finite coordinates) propagate as
//! [`BasinGridError::InvalidAxis`].

use crate::catchment::Catchment;
use crate::config::SubsetOptions;
use crate::errors::{BasinGridError, Result};
use crate::geometry::Bounds;
use crate::grid::{grid_resolution, Grid};
use crate::raster::{AxisKind, RasterDataset};
use geo::Intersects;
use ndarray::{Array1, Array2, Axis, Zip};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info, warn};

/// Spacing assumed by the fallback window for single-sample axes
pub const FALLBACK_SPACING: f64 = 0.25;

/// Which selection produced a [`SubsetResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SubsetOutcome {
    /// Range selection on the (buffered) bounds
    BoundingBox,
    /// Centred fallback window after an empty range selection
    NearestWindow { size: usize },
    /// Nothing could be selected; the dataset is returned unchanged
    NoOp { reason: String },
}

impl SubsetOutcome {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::BoundingBox)
    }
}

impl fmt::Display for SubsetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoundingBox => f.write_str("bounding box"),
            Self::NearestWindow { size } => write!(f, "nearest {size}x{size} window"),
            Self::NoOp { reason } => write!(f, "no-op ({reason})"),
        }
    }
}

/// A spatially reduced dataset and how it was obtained
///
/// On [`SubsetOutcome::NoOp`] without clipping, `dataset` borrows the input.
#[derive(Debug, Clone)]
pub struct SubsetResult<'a> {
    pub dataset: Cow<'a, RasterDataset>,
    pub outcome: SubsetOutcome,
    /// Cells outside the catchment were masked
    pub clipped: bool,
}

impl<'a> SubsetResult<'a> {
    pub fn is_degraded(&self) -> bool {
        self.outcome.is_degraded()
    }

    pub fn into_owned(self) -> RasterDataset {
        self.dataset.into_owned()
    }
}

/// Positions whose coordinate lies in `[lo, hi]`, in axis order
///
/// Works for ascending and descending axes alike.
fn range_indices(axis: &str, values: &Array1<f64>, lo: f64, hi: f64) -> Result<Vec<usize>> {
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(BasinGridError::invalid_axis(
            axis,
            format!("non-finite coordinate {bad}"),
        ));
    }
    Ok(values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v >= lo && v <= hi)
        .map(|(i, _)| i)
        .collect())
}

fn select_window(
    dataset: &RasterDataset,
    x_name: &str,
    y_name: &str,
    xs: &[usize],
    ys: &[usize],
) -> Result<RasterDataset> {
    dataset.select_indices(x_name, xs)?.select_indices(y_name, ys)
}

/// Mask cells the catchment does not touch and crop to the touched extent
///
/// Axes come back named `lat`/`lon`. Returns `None` when no cell is touched.
fn clip_to_catchment(
    dataset: &RasterDataset,
    x_name: &str,
    y_name: &str,
    catchment: &Catchment,
) -> Result<Option<RasterDataset>> {
    info!("clipping dataset to catchment boundary");
    let crs = dataset.crs().unwrap_or(catchment.crs());
    let standard = dataset
        .clone()
        .rename_axis(y_name, "y")?
        .rename_axis(x_name, "x")?
        .retain_layers(|l| l.has_dim("y") && l.has_dim("x"))
        .retain_layers(|l| l.name != "spatial_ref" && l.name != "crs")
        .with_crs(crs);

    let grid = Grid::from_dataset(&standard)?;
    let shape = catchment.geometry();
    let mut touched = Array2::from_elem(grid.shape(), false);
    Zip::indexed(&mut touched).par_for_each(|(i, j), t| {
        *t = shape.intersects(&grid.cell_rect(i, j).to_polygon());
    });

    let rows: Vec<usize> = touched
        .axis_iter(Axis(0))
        .enumerate()
        .filter(|(_, row)| row.iter().any(|&t| t))
        .map(|(i, _)| i)
        .collect();
    let cols: Vec<usize> = touched
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, col)| col.iter().any(|&t| t))
        .map(|(j, _)| j)
        .collect();
    if rows.is_empty() || cols.is_empty() {
        return Ok(None);
    }

    let touched = touched.select(Axis(0), &rows).select(Axis(1), &cols);
    let mut cropped = select_window(&standard, "x", "y", &cols, &rows)?;
    for layer in cropped.layers_mut() {
        let (Some(iy), Some(ix)) = (layer.dim_index("y"), layer.dim_index("x")) else {
            continue;
        };
        for (index, value) in layer.data.indexed_iter_mut() {
            if !touched[[index[iy], index[ix]]] {
                *value = f32::NAN;
            }
        }
    }
    debug!(
        touched = touched.iter().filter(|&&t| t).count(),
        rows = rows.len(),
        cols = cols.len(),
        "catchment clip"
    );

    Ok(Some(cropped.rename_axis("y", "lat")?.rename_axis("x", "lon")?))
}

/// Restrict `dataset` to `bounds`, optionally clipping to `catchment`
///
/// `bounds` and `catchment` must be in the dataset's coordinate system.
pub fn spatial_subset<'a>(
    dataset: &'a RasterDataset,
    bounds: &Bounds,
    catchment: Option<&Catchment>,
    options: &SubsetOptions,
) -> Result<SubsetResult<'a>> {
    let (Some(x_axis), Some(y_axis)) = (
        dataset.find_axis(AxisKind::X),
        dataset.find_axis(AxisKind::Y),
    ) else {
        warn!("could not identify spatial dimensions, returning full dataset");
        return Ok(SubsetResult {
            dataset: Cow::Borrowed(dataset),
            outcome: SubsetOutcome::NoOp {
                reason: "no spatial dimensions".to_string(),
            },
            clipped: false,
        });
    };

    let mut working = Cow::Borrowed(dataset);
    let mut x_name = x_axis.name.clone();
    let mut y_name = y_axis.name.clone();
    let mut clipped = false;

    if options.clip_to_boundary {
        match catchment {
            Some(catchment) => {
                match clip_to_catchment(dataset, &x_name, &y_name, catchment)? {
                    Some(masked) => {
                        working = Cow::Owned(masked);
                        x_name = "lon".to_string();
                        y_name = "lat".to_string();
                        clipped = true;
                    }
                    None => warn!("catchment touches no grid cell, skipping clip"),
                }
            }
            None => warn!("clip to boundary requested without a catchment, skipping clip"),
        }
    }

    let xs = working
        .axis(&x_name)
        .map(|a| a.values.clone())
        .ok_or_else(|| BasinGridError::invalid_axis(&x_name, "axis disappeared"))?;
    let ys = working
        .axis(&y_name)
        .map(|a| a.values.clone())
        .ok_or_else(|| BasinGridError::invalid_axis(&y_name, "axis disappeared"))?;
    let xs_vec = xs.to_vec();
    let ys_vec = ys.to_vec();

    let (mut minx, mut miny, mut maxx, mut maxy) =
        (bounds.min_x(), bounds.min_y(), bounds.max_x(), bounds.max_y());
    let x_spacing = grid_resolution(&xs_vec, 0.0);
    let y_spacing = grid_resolution(&ys_vec, 0.0);

    if clipped {
        // touched cells may have centres up to half a cell outside the bounds
        minx -= x_spacing / 2.0;
        maxx += x_spacing / 2.0;
        miny -= y_spacing / 2.0;
        maxy += y_spacing / 2.0;
    } else if options.buffer_cells > 0 && x_spacing > 0.0 && y_spacing > 0.0 {
        let n = options.buffer_cells as f64;
        minx -= n * x_spacing;
        maxx += n * x_spacing;
        miny -= n * y_spacing;
        maxy += n * y_spacing;
        info!("applied {} cell buffer to bounds", options.buffer_cells);
    }

    let x_idx = range_indices(&x_name, &xs, minx, maxx)?;
    let y_idx = range_indices(&y_name, &ys, miny, maxy)?;

    let (x_idx, y_idx, outcome) = if x_idx.is_empty() || y_idx.is_empty() {
        info!("range selection returned empty, using nearest neighbour window");
        let (cx, cy) = bounds.center();
        let size = (2 * options.buffer_cells + 1).max(1);
        let half_x = size as f64 * grid_resolution(&xs_vec, FALLBACK_SPACING) / 2.0;
        let half_y = size as f64 * grid_resolution(&ys_vec, FALLBACK_SPACING) / 2.0;
        info!("using {size}x{size} grid centred on catchment");

        let x_idx = range_indices(&x_name, &xs, cx - half_x, cx + half_x)?;
        let y_idx = range_indices(&y_name, &ys, cy - half_y, cy + half_y)?;
        if x_idx.is_empty() || y_idx.is_empty() {
            warn!("could not find any coordinates, returning full dataset");
            return Ok(SubsetResult {
                dataset: working,
                outcome: SubsetOutcome::NoOp {
                    reason: "no coordinates within the fallback window".to_string(),
                },
                clipped,
            });
        }
        info!(
            "found {} x {} coordinates in range",
            x_idx.len(),
            y_idx.len()
        );
        (x_idx, y_idx, SubsetOutcome::NearestWindow { size })
    } else {
        (x_idx, y_idx, SubsetOutcome::BoundingBox)
    };

    let subset = select_window(&working, &x_name, &y_name, &x_idx, &y_idx)?;
    info!(
        x = x_idx.len(),
        y = y_idx.len(),
        outcome = %outcome,
        "subset shape"
    );

    Ok(SubsetResult {
        dataset: Cow::Owned(subset),
        outcome,
        clipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_selection_is_direction_agnostic() {
        let asc = Array1::from(vec![0.0, 1.0, 2.0, 3.0]);
        let desc = Array1::from(vec![3.0, 2.0, 1.0, 0.0]);
        assert_eq!(range_indices("x", &asc, 1.0, 2.0).unwrap(), vec![1, 2]);
        assert_eq!(range_indices("x", &desc, 1.0, 2.0).unwrap(), vec![1, 2]);
    }

    #[test]
    fn non_finite_coordinates_are_errors() {
        let bad = Array1::from(vec![0.0, f64::NAN]);
        assert!(matches!(
            range_indices("lat", &bad, 0.0, 1.0),
            Err(BasinGridError::InvalidAxis { .. })
        ));
    }
}
