//! Coordinate reference systems and coordinate transformation
//!
//! CRSs are identified by EPSG code and resolved against the bundled
//! `crs-definitions` database, then transformed with pure-Rust PROJ strings
//! (`proj4rs`). Geographic systems are expressed in degrees at the API
//! boundary; `proj4rs` works in radians internally.

use crate::errors::{BasinGridError, Result};
use geo::Coord;
use proj4rs::proj::Proj;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An EPSG-coded coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// WGS 84 geographic coordinates (lon/lat degrees)
    pub const WGS84: Self = Self { epsg: 4326 };

    /// ETRS89 / LAEA Europe, the planar equal-area system used for buffering and areas
    pub const ETRS89_LAEA: Self = Self { epsg: 3035 };

    /// Web Mercator
    pub const WEB_MERCATOR: Self = Self { epsg: 3857 };

    /// Create a CRS from an EPSG code known to the bundled database
    pub fn from_epsg(code: u16) -> Result<Self> {
        if crs_definitions::from_code(code).is_none() {
            return Err(BasinGridError::crs(format!(
                "EPSG:{code} is not in the crs-definitions database"
            )));
        }
        Ok(Self { epsg: code })
    }

    /// EPSG code
    #[must_use]
    pub const fn epsg(&self) -> u16 {
        self.epsg
    }

    /// PROJ4 definition string for this CRS
    pub fn proj_string(&self) -> Result<&'static str> {
        crs_definitions::from_code(self.epsg)
            .map(|def| def.proj4)
            .ok_or_else(|| BasinGridError::crs(format!("no definition for EPSG:{}", self.epsg)))
    }

    /// Whether coordinates in this CRS are longitude/latitude degrees
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        match self.proj_string() {
            Ok(proj) => proj.contains("+proj=longlat"),
            Err(_) => (4000..5000).contains(&self.epsg),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = BasinGridError;

    /// Accepts `EPSG:4326`, `epsg:4326`, `urn:ogc:def:crs:EPSG::4326` and `4326`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            upper.rsplit(':').next().unwrap_or_default()
        } else {
            upper.as_str()
        };

        let code: u16 = code
            .trim()
            .parse()
            .map_err(|_| BasinGridError::crs(format!("cannot parse CRS identifier '{trimmed}'")))?;
        Self::from_epsg(code)
    }
}

impl TryFrom<String> for Crs {
    type Error = BasinGridError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

/// Point transformer between two CRSs
///
/// Building the PROJ definitions is comparatively expensive, so a
/// transformer is created once and reused for every vertex of a geometry.
pub struct Transformer {
    source: Crs,
    target: Crs,
    source_geographic: bool,
    target_geographic: bool,
    projs: Option<(Proj, Proj)>,
}

impl Transformer {
    /// Create a transformer from `source` to `target`
    pub fn new(source: Crs, target: Crs) -> Result<Self> {
        if source == target {
            return Ok(Self {
                source,
                target,
                source_geographic: source.is_geographic(),
                target_geographic: target.is_geographic(),
                projs: None,
            });
        }

        let source_proj = Proj::from_proj_string(source.proj_string()?)
            .map_err(|e| BasinGridError::crs(format!("invalid source projection {source}: {e:?}")))?;
        let target_proj = Proj::from_proj_string(target.proj_string()?)
            .map_err(|e| BasinGridError::crs(format!("invalid target projection {target}: {e:?}")))?;

        Ok(Self {
            source,
            target,
            source_geographic: source.is_geographic(),
            target_geographic: target.is_geographic(),
            projs: Some((source_proj, target_proj)),
        })
    }

    #[must_use]
    pub fn source(&self) -> Crs {
        self.source
    }

    #[must_use]
    pub fn target(&self) -> Crs {
        self.target
    }

    /// Whether source and target are the same CRS
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.projs.is_none()
    }

    /// Transform a single `(x, y)` position
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let Some((source_proj, target_proj)) = &self.projs else {
            return Ok((x, y));
        };

        let (x_in, y_in) = if self.source_geographic {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        let mut point = (x_in, y_in, 0.0);
        proj4rs::transform::transform(source_proj, target_proj, &mut point).map_err(|e| {
            BasinGridError::crs(format!(
                "transform from {} to {} failed at ({x}, {y}): {e:?}",
                self.source, self.target
            ))
        })?;

        let out = if self.target_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out.0.is_finite() || !out.1.is_finite() {
            return Err(BasinGridError::crs(format!(
                "transform from {} to {} produced a non-finite position for ({x}, {y})",
                self.source, self.target
            )));
        }
        Ok(out)
    }

    /// Transform a `geo` coordinate
    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (x, y) = self.transform(coord.x, coord.y)?;
        Ok(Coord { x, y })
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}
