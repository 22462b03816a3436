//! Configuration for catchment validation and spatial subsetting
//!
//! Every value has a default; a settings file (YAML or JSON, picked by
//! extension) and CLI flags override them.

use crate::crs::Crs;
use crate::errors::{BasinGridError, Result};
use crate::geometry::Bounds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Catchment policy limits and normalization switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchmentPolicy {
    /// Buffer distance for points/lines, in metres of `area_crs`
    pub buffer_distance_m: f64,
    /// Reference region the catchment must overlap
    pub aoi: Bounds,
    /// CRS of `aoi`
    pub aoi_crs: Crs,
    /// Planar equal-area CRS used for buffering and area measurement
    pub area_crs: Crs,
    pub min_area_km2: f64,
    pub max_area_km2: f64,
    pub max_features: usize,
    /// Minimum fraction of the catchment area inside `aoi`
    pub min_overlap_fraction: f64,
    pub validate_aoi: bool,
    pub validate_size: bool,
    pub buffer_points_lines: bool,
    pub merge_features: bool,
}

impl Default for CatchmentPolicy {
    fn default() -> Self {
        Self {
            buffer_distance_m: 1000.0,
            aoi: Bounds::europe(),
            aoi_crs: Crs::WGS84,
            area_crs: Crs::ETRS89_LAEA,
            min_area_km2: 0.01,
            max_area_km2: 500_000.0,
            max_features: 1000,
            min_overlap_fraction: 0.1,
            validate_aoi: true,
            validate_size: true,
            buffer_points_lines: true,
            merge_features: true,
        }
    }
}

impl CatchmentPolicy {
    pub fn with_buffer_distance(mut self, metres: f64) -> Self {
        self.buffer_distance_m = metres;
        self
    }

    pub fn with_aoi(mut self, aoi: Bounds, crs: Crs) -> Self {
        self.aoi = aoi;
        self.aoi_crs = crs;
        self
    }

    pub fn with_area_range(mut self, min_km2: f64, max_km2: f64) -> Self {
        self.min_area_km2 = min_km2;
        self.max_area_km2 = max_km2;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_min_overlap_fraction(mut self, fraction: f64) -> Self {
        self.min_overlap_fraction = fraction;
        self
    }

    pub fn with_validation(mut self, aoi: bool, size: bool) -> Self {
        self.validate_aoi = aoi;
        self.validate_size = size;
        self
    }

    pub fn with_buffer_points_lines(mut self, enabled: bool) -> Self {
        self.buffer_points_lines = enabled;
        self
    }

    /// Reject settings no catchment could satisfy
    pub fn validate(&self) -> Result<()> {
        if !(self.buffer_distance_m.is_finite() && self.buffer_distance_m > 0.0) {
            return Err(BasinGridError::ConfigError(format!(
                "buffer_distance_m must be positive, got {}",
                self.buffer_distance_m
            )));
        }
        if !(self.min_area_km2 >= 0.0 && self.min_area_km2 <= self.max_area_km2) {
            return Err(BasinGridError::ConfigError(format!(
                "area range [{}, {}] km² is empty",
                self.min_area_km2, self.max_area_km2
            )));
        }
        if !(0.0..=1.0).contains(&self.min_overlap_fraction) {
            return Err(BasinGridError::ConfigError(format!(
                "min_overlap_fraction must be within [0, 1], got {}",
                self.min_overlap_fraction
            )));
        }
        if self.max_features == 0 {
            return Err(BasinGridError::ConfigError(
                "max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Spatial subsetting options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetOptions {
    /// Grid cells added around the catchment bounds
    pub buffer_cells: usize,
    /// Mask cells outside the catchment boundary (all-touched rule)
    pub clip_to_boundary: bool,
}

impl Default for SubsetOptions {
    fn default() -> Self {
        Self {
            buffer_cells: 1,
            clip_to_boundary: false,
        }
    }
}

impl SubsetOptions {
    pub fn with_buffer_cells(mut self, cells: usize) -> Self {
        self.buffer_cells = cells;
        self
    }

    pub fn with_clip(mut self, clip: bool) -> Self {
        self.clip_to_boundary = clip;
        self
    }
}

/// All runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub policy: CatchmentPolicy,
    pub subset: SubsetOptions,
    /// Worker threads for parallel grid computations; `None` uses rayon's default
    pub threads: Option<usize>,
}

impl Settings {
    /// Load settings from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            other => {
                return Err(BasinGridError::ConfigError(format!(
                    "unsupported settings file extension {other:?} for {}",
                    path.display()
                )))
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;
        if self.threads == Some(0) {
            return Err(BasinGridError::ConfigError(
                "threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
