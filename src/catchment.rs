//! Loading user catchments into validated single-geometry form
//!
//! The pipeline reads the input (GeoJSON file, extent box or an in-memory
//! collection), optionally reprojects it, buffers and merges it, runs the
//! policy checks and only then hands out a [`Catchment`].

use crate::config::CatchmentPolicy;
use crate::crs::{Crs, Transformer};
use crate::errors::{BasinGridError, Result};
use crate::geometry::{
    normalize, read_geojson, reproject_multi_polygon, union_all, Bounds, FeatureCollection,
    Geometry, GeometryClass, NormalizeOptions,
};
use crate::validation::{validate, ValidationReport};
use geo::{Area, BoundingRect, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Where a catchment came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    File { path: PathBuf },
    Extent { extent: [f64; 4], crs: Crs },
    InMemory,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => write!(f, "file {}", path.display()),
            Self::Extent { extent, crs } => write!(
                f,
                "extent [{}, {}, {}, {}] ({crs})",
                extent[0], extent[1], extent[2], extent[3]
            ),
            Self::InMemory => f.write_str("in-memory collection"),
        }
    }
}

/// Catchment input
#[derive(Debug, Clone)]
pub enum CatchmentSource {
    /// GeoJSON file
    File(PathBuf),
    /// `[minx, miny, maxx, maxy]` box in `crs`
    Extent { extent: Vec<f64>, crs: Crs },
    Collection(FeatureCollection),
}

impl CatchmentSource {
    fn read(&self) -> Result<(FeatureCollection, Provenance)> {
        match self {
            Self::File(path) => {
                if !path.exists() {
                    return Err(BasinGridError::IoError(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("catchment file not found: {}", path.display()),
                    )));
                }
                info!(path = %path.display(), "loading catchment from file");
                Ok((read_geojson(path)?, Provenance::File { path: path.clone() }))
            }
            Self::Extent { extent, crs } => {
                info!("loading catchment from manual extent");
                let collection = FeatureCollection::from_extent(extent, *crs)?;
                let bounds = Bounds::from_extent(extent)?;
                Ok((
                    collection,
                    Provenance::Extent {
                        extent: bounds.to_array(),
                        crs: *crs,
                    },
                ))
            }
            Self::Collection(collection) => Ok((collection.clone(), Provenance::InMemory)),
        }
    }
}

/// A normalized, validated catchment: one polygonal geometry with a CRS
#[derive(Debug, Clone, PartialEq)]
pub struct Catchment {
    geometry: MultiPolygon<f64>,
    crs: Crs,
    provenance: Provenance,
}

impl Catchment {
    /// Fails when the geometry is empty or has zero area
    pub fn new(geometry: MultiPolygon<f64>, crs: Crs, provenance: Provenance) -> Result<Self> {
        if geometry.0.is_empty() {
            return Err(BasinGridError::geometry("catchment geometry is empty"));
        }
        if !(geometry.unsigned_area() > 0.0) {
            return Err(BasinGridError::geometry("catchment geometry has zero area"));
        }
        Ok(Self {
            geometry,
            crs,
            provenance,
        })
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Total bounds in the catchment's CRS
    pub fn bounds(&self) -> Result<Bounds> {
        self.geometry
            .bounding_rect()
            .and_then(|r| Bounds::from_rect(&r))
            .ok_or_else(|| BasinGridError::geometry("catchment has degenerate bounds"))
    }

    /// Area in squared units of the catchment's CRS
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    pub fn reproject(&self, target: Crs) -> Result<Self> {
        if target == self.crs {
            return Ok(self.clone());
        }
        info!(from = %self.crs, to = %target, "reprojecting catchment");
        let transformer = Transformer::new(self.crs, target)?;
        Self::new(
            reproject_multi_polygon(&self.geometry, &transformer)?,
            target,
            self.provenance.clone(),
        )
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::new(
            vec![Geometry::MultiPolygon(self.geometry.clone())],
            Some(self.crs),
        )
    }
}

/// Normalized input plus its validation report, before acceptance
#[derive(Debug, Clone)]
pub struct PreparedCatchment {
    pub collection: FeatureCollection,
    pub merged: Option<MultiPolygon<f64>>,
    pub class: GeometryClass,
    pub report: ValidationReport,
    pub provenance: Provenance,
}

impl PreparedCatchment {
    /// Accept the catchment if every check passed
    ///
    /// Without a merged geometry (merging disabled, several features) the
    /// members are unioned here, so overlapping features count once.
    pub fn into_catchment(self) -> Result<Catchment> {
        self.report.into_result()?;
        let crs = self
            .collection
            .crs()
            .ok_or_else(|| BasinGridError::crs("catchment has no CRS defined"))?;
        let geometry = match self.merged {
            Some(merged) => merged,
            None => union_all(self.collection.polygonal_features()),
        };
        Catchment::new(geometry, crs, self.provenance)
    }
}

/// Read, normalize and validate a catchment without failing on policy checks
pub fn prepare_catchment(
    source: &CatchmentSource,
    target_crs: Option<Crs>,
    policy: &CatchmentPolicy,
) -> Result<PreparedCatchment> {
    let (mut collection, provenance) = source.read()?;
    if collection.is_empty() {
        return Err(BasinGridError::geometry("catchment is empty"));
    }
    info!(
        crs = ?collection.crs().map(|c| c.to_string()),
        features = collection.len(),
        "catchment loaded"
    );

    if let Some(target) = target_crs {
        if collection.crs() != Some(target) {
            info!(target = %target, "reprojecting catchment");
            collection = collection.reproject(target)?;
        }
    }

    let normalized = normalize(&collection, &NormalizeOptions::from(policy))?;
    let report = validate(&normalized.collection, policy)?;

    Ok(PreparedCatchment {
        collection: normalized.collection,
        merged: normalized.merged,
        class: normalized.class,
        report,
        provenance,
    })
}

/// Full catchment pipeline; any failing policy check is fatal
pub fn load_catchment(
    source: &CatchmentSource,
    target_crs: Option<Crs>,
    policy: &CatchmentPolicy,
) -> Result<Catchment> {
    prepare_catchment(source, target_crs, policy)?.into_catchment()
}

/// Minimal acceptance of a collection built elsewhere
///
/// Only requires a non-empty polygonal collection with a CRS; several
/// features are unioned into one geometry.
pub fn validate_preloaded(collection: &FeatureCollection) -> Result<Catchment> {
    if collection.is_empty() {
        return Err(BasinGridError::geometry("catchment is empty"));
    }
    let crs = collection
        .crs()
        .ok_or_else(|| BasinGridError::crs("catchment has no CRS defined"))?;
    if collection.len() > 1 {
        info!("merging {} features into single geometry", collection.len());
    }
    let geometry = union_all(collection.polygonal_features());
    info!(crs = %crs, "using pre-loaded catchment");
    Catchment::new(geometry, crs, Provenance::InMemory)
}
