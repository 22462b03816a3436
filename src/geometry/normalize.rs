//! Turning classified input features into polygon catchments

use super::{buffer_collection, union_all, FeatureCollection, Geometry, GeometryClass};
use crate::config::CatchmentPolicy;
use crate::crs::Crs;
use crate::errors::{BasinGridError, Result};
use geo::MultiPolygon;
use tracing::{info, warn};

/// Options controlling [`normalize`]
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Buffer distance in units of `planar_crs`
    pub buffer_distance: f64,
    /// Buffer point/line input instead of rejecting it
    pub buffer_points_lines: bool,
    /// Union multiple features into one geometry
    pub merge_features: bool,
    /// Planar, area-preserving CRS used for buffering
    pub planar_crs: Crs,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from(&CatchmentPolicy::default())
    }
}

impl From<&CatchmentPolicy> for NormalizeOptions {
    fn from(policy: &CatchmentPolicy) -> Self {
        Self {
            buffer_distance: policy.buffer_distance_m,
            buffer_points_lines: policy.buffer_points_lines,
            merge_features: policy.merge_features,
            planar_crs: policy.area_crs,
        }
    }
}

/// Output of [`normalize`]
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Polygon-only features in the input CRS
    pub collection: FeatureCollection,
    /// Single geometry for single-geometry consumers: the union when merging
    /// was requested, or the only feature; `None` for unmerged multi-feature input
    pub merged: Option<MultiPolygon<f64>>,
    /// Classification of the input before buffering
    pub class: GeometryClass,
}

/// Classify, buffer and optionally merge input features
///
/// Point and line collections are buffered in `planar_crs` and reprojected
/// back. In a polygon-classified collection any stray point/line features
/// are dropped with a warning.
pub fn normalize(input: &FeatureCollection, options: &NormalizeOptions) -> Result<Normalized> {
    if input.is_empty() {
        return Err(BasinGridError::geometry("catchment contains no features"));
    }

    let class = input.classify();
    info!(geometry_type = %class, features = input.len(), "classified catchment geometry");

    let collection = match class {
        GeometryClass::Unknown => {
            return Err(BasinGridError::geometry(
                "catchment contains unsupported geometry types",
            ))
        }
        GeometryClass::Line | GeometryClass::Point if !options.buffer_points_lines => {
            return Err(BasinGridError::geometry(format!(
                "catchment contains {class} geometries; enable buffering of points and lines to convert them to polygons"
            )))
        }
        GeometryClass::Line | GeometryClass::Point => {
            info!("converting {class} geometry to polygon via buffering");
            let usable: Vec<Geometry> = input
                .features()
                .iter()
                .filter(|g| g.class() != GeometryClass::Unknown)
                .cloned()
                .collect();
            let usable = FeatureCollection::new(usable, input.crs());
            buffer_collection(&usable, options.buffer_distance, options.planar_crs)?
        }
        GeometryClass::Polygon => {
            let polygons: Vec<Geometry> = input
                .features()
                .iter()
                .filter(|g| g.class() == GeometryClass::Polygon)
                .cloned()
                .collect();
            let dropped = input.len() - polygons.len();
            if dropped > 0 {
                warn!(dropped, "ignoring non-polygon features in a polygon catchment");
            }
            FeatureCollection::new(polygons, input.crs())
        }
    };

    let merged = if options.merge_features && collection.len() > 1 {
        info!("creating catchment outline from {} features", collection.len());
        Some(union_all(collection.polygonal_features()))
    } else if collection.len() == 1 {
        collection.polygonal_features().next()
    } else {
        None
    };

    Ok(Normalized {
        collection,
        merged,
        class,
    })
}
