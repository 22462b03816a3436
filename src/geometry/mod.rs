//! Vector geometry model, classification and reprojection
//!
//! Input features are converted once, at ingestion, into the tagged
//! [`Geometry`] variant. Everything downstream switches on the tag or on the
//! collection-level [`GeometryClass`]; nothing re-inspects raw input.
//!
//! # Organization
//!
//! - [`bounds`]: axis-aligned bounding boxes
//! - [`buffer`]: converting points and lines into polygons
//! - [`clip`]: exact polygon/rectangle intersection areas
//! - [`geojson`]: reading feature collections from GeoJSON
//! - [`normalize`]: buffering and merging into a single catchment polygon

pub mod bounds;
pub mod buffer;
pub mod clip;
pub mod geojson;
pub mod normalize;

pub use bounds::Bounds;
pub use buffer::{buffer_collection, buffer_geometry, DEFAULT_QUADRANT_SEGMENTS};
pub use clip::{intersection_area, rect_intersection_area};
pub use self::geojson::{parse_geojson, read_geojson};
pub use normalize::{normalize, NormalizeOptions, Normalized};

use crate::crs::{Crs, Transformer};
use crate::errors::{BasinGridError, Result};
use geo::{
    BooleanOps, BoundingRect, Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon, Rect,
};
use std::fmt;

/// A single input feature geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    Line(LineString<f64>),
    MultiLine(MultiLineString<f64>),
    Point(Point<f64>),
    MultiPoint(MultiPoint<f64>),
    /// Any other geometry type, keeping its type name for diagnostics
    Unsupported(String),
}

/// Dominant geometry type of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GeometryClass {
    Polygon,
    Line,
    Point,
    Unknown,
}

impl GeometryClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polygon => "polygon",
            Self::Line => "line",
            Self::Point => "point",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GeometryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Geometry {
    /// Class of this single geometry
    #[must_use]
    pub fn class(&self) -> GeometryClass {
        match self {
            Self::Polygon(_) | Self::MultiPolygon(_) => GeometryClass::Polygon,
            Self::Line(_) | Self::MultiLine(_) => GeometryClass::Line,
            Self::Point(_) | Self::MultiPoint(_) => GeometryClass::Point,
            Self::Unsupported(_) => GeometryClass::Unknown,
        }
    }

    /// GeoJSON-style type name
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
            Self::Line(_) => "LineString",
            Self::MultiLine(_) => "MultiLineString",
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::Unsupported(name) => name,
        }
    }

    /// Polygonal content as a multipolygon; `None` for non-polygon geometries
    #[must_use]
    pub fn to_multi_polygon(&self) -> Option<MultiPolygon<f64>> {
        match self {
            Self::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
            Self::MultiPolygon(mp) => Some(mp.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Self::Polygon(p) => p.bounding_rect(),
            Self::MultiPolygon(mp) => mp.bounding_rect(),
            Self::Line(ls) => ls.bounding_rect(),
            Self::MultiLine(mls) => mls.bounding_rect(),
            Self::Point(p) => Some(p.bounding_rect()),
            Self::MultiPoint(mp) => mp.bounding_rect(),
            Self::Unsupported(_) => None,
        }
    }

    /// Apply a coordinate transformation to every vertex
    pub fn reproject(&self, transformer: &Transformer) -> Result<Self> {
        if transformer.is_identity() {
            return Ok(self.clone());
        }
        Ok(match self {
            Self::Polygon(p) => Self::Polygon(reproject_polygon(p, transformer)?),
            Self::MultiPolygon(mp) => Self::MultiPolygon(reproject_multi_polygon(mp, transformer)?),
            Self::Line(ls) => Self::Line(reproject_line_string(ls, transformer)?),
            Self::MultiLine(mls) => Self::MultiLine(MultiLineString::new(
                mls.iter()
                    .map(|ls| reproject_line_string(ls, transformer))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Self::Point(p) => Self::Point(transformer.transform_coord(p.0)?.into()),
            Self::MultiPoint(mp) => Self::MultiPoint(MultiPoint::new(
                mp.iter()
                    .map(|p| transformer.transform_coord(p.0).map(Point::from))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Self::Unsupported(name) => Self::Unsupported(name.clone()),
        })
    }
}

pub(crate) fn reproject_line_string(
    ls: &LineString<f64>,
    transformer: &Transformer,
) -> Result<LineString<f64>> {
    let coords = ls
        .coords()
        .map(|c| transformer.transform_coord(*c))
        .collect::<Result<Vec<Coord<f64>>>>()?;
    Ok(LineString::new(coords))
}

pub(crate) fn reproject_polygon(p: &Polygon<f64>, transformer: &Transformer) -> Result<Polygon<f64>> {
    let exterior = reproject_line_string(p.exterior(), transformer)?;
    let interiors = p
        .interiors()
        .iter()
        .map(|ring| reproject_line_string(ring, transformer))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

pub(crate) fn reproject_multi_polygon(
    mp: &MultiPolygon<f64>,
    transformer: &Transformer,
) -> Result<MultiPolygon<f64>> {
    Ok(MultiPolygon::new(
        mp.iter()
            .map(|p| reproject_polygon(p, transformer))
            .collect::<Result<Vec<_>>>()?,
    ))
}

/// Union of any number of multipolygons
#[must_use]
pub fn union_all<I>(parts: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = MultiPolygon<f64>>,
{
    parts
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, part| {
            if acc.0.is_empty() {
                part
            } else {
                acc.union(&part)
            }
        })
}

/// Classify a set of geometries by the highest-priority type present
///
/// Priority is polygon > line > point. Mixed collections take the highest
/// class found; `Unknown` only when no recognized type is present.
#[must_use]
pub fn classify(geometries: &[Geometry]) -> GeometryClass {
    geometries
        .iter()
        .map(Geometry::class)
        .min()
        .unwrap_or(GeometryClass::Unknown)
}

/// A set of feature geometries sharing one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Geometry>,
    crs: Option<Crs>,
}

impl FeatureCollection {
    #[must_use]
    pub fn new(features: Vec<Geometry>, crs: Option<Crs>) -> Self {
        Self { features, crs }
    }

    /// A single box feature from a `[minx, miny, maxx, maxy]` extent
    pub fn from_extent(extent: &[f64], crs: Crs) -> Result<Self> {
        let bounds = Bounds::from_extent(extent)?;
        Ok(Self::new(vec![Geometry::Polygon(bounds.to_polygon())], Some(crs)))
    }

    #[must_use]
    pub fn features(&self) -> &[Geometry] {
        &self.features
    }

    #[must_use]
    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn classify(&self) -> GeometryClass {
        classify(&self.features)
    }

    /// Reproject every feature; fails when the collection has no CRS
    pub fn reproject(&self, target: Crs) -> Result<Self> {
        let source = self
            .crs
            .ok_or_else(|| BasinGridError::crs("feature collection has no CRS defined"))?;
        let transformer = Transformer::new(source, target)?;
        let features = self
            .features
            .iter()
            .map(|g| g.reproject(&transformer))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(features, Some(target)))
    }

    /// Bounding box of all features
    #[must_use]
    pub fn total_bounds(&self) -> Option<Bounds> {
        let rect = self
            .features
            .iter()
            .filter_map(Geometry::bounding_rect)
            .reduce(|a, b| {
                Rect::new(
                    Coord {
                        x: a.min().x.min(b.min().x),
                        y: a.min().y.min(b.min().y),
                    },
                    Coord {
                        x: a.max().x.max(b.max().x),
                        y: a.max().y.max(b.max().y),
                    },
                )
            })?;
        Bounds::from_rect(&rect)
    }

    /// All polygonal features, individually
    pub fn polygonal_features(&self) -> impl Iterator<Item = MultiPolygon<f64>> + '_ {
        self.features.iter().filter_map(Geometry::to_multi_polygon)
    }

    /// Union of all polygonal features
    #[must_use]
    pub fn union(&self) -> MultiPolygon<f64> {
        union_all(self.polygonal_features())
    }
}
