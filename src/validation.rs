//! Catchment policy checks
//!
//! Each check is a pure predicate returning a [`CheckResult`]; [`validate`]
//! runs every enabled check and collects them into a [`ValidationReport`]
//! without short-circuiting.

use crate::config::CatchmentPolicy;
use crate::crs::Crs;
use crate::errors::{BasinGridError, Result};
use crate::geometry::{intersection_area, union_all, Bounds, FeatureCollection};
use geo::{Area, Intersects};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Policy rule identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCheck {
    FeatureCount,
    AoiOverlap,
    CatchmentSize,
}

impl PolicyCheck {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FeatureCount => "feature_count",
            Self::AoiOverlap => "aoi_overlap",
            Self::CatchmentSize => "catchment_size",
        }
    }
}

impl fmt::Display for PolicyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one policy check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub check: PolicyCheck,
    pub passed: bool,
    /// Measured quantity: feature count, overlap fraction or area in km²
    pub measured: f64,
    pub message: String,
}

impl CheckResult {
    fn new(check: PolicyCheck, passed: bool, measured: f64, message: impl Into<String>) -> Self {
        Self {
            check,
            passed,
            measured,
            message: message.into(),
        }
    }

    /// The `(ok, measured, message)` triple
    pub fn as_tuple(&self) -> (bool, f64, &str) {
        (self.passed, self.measured, &self.message)
    }
}

/// Ordered results of every evaluated check
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    entries: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn push(&mut self, result: CheckResult) {
        self.entries.push(result);
    }

    pub fn entries(&self) -> &[CheckResult] {
        &self.entries
    }

    pub fn is_valid(&self) -> bool {
        self.entries.iter().all(|e| e.passed)
    }

    pub fn first_failure(&self) -> Option<&CheckResult> {
        self.entries.iter().find(|e| !e.passed)
    }

    /// Convert the first failing check into a [`BasinGridError::ValidationError`]
    pub fn into_result(self) -> Result<Self> {
        if let Some(failure) = self.first_failure() {
            return Err(BasinGridError::ValidationError {
                check: failure.check.to_string(),
                measured: failure.measured,
                message: failure.message.clone(),
            });
        }
        Ok(self)
    }
}

/// Fail when the collection holds more than `max_features` features
pub fn check_feature_count(collection: &FeatureCollection, max_features: usize) -> CheckResult {
    let count = collection.len();
    if count > max_features {
        CheckResult::new(
            PolicyCheck::FeatureCount,
            false,
            count as f64,
            format!("Too many features ({count}). Maximum allowed: {max_features}"),
        )
    } else {
        CheckResult::new(
            PolicyCheck::FeatureCount,
            true,
            count as f64,
            format!("Number of features: {count}"),
        )
    }
}

/// Fraction of the catchment area inside `aoi`, measured in `aoi_crs`
///
/// Fails without a CRS, without any intersection, or below
/// `min_overlap_fraction`. A zero-area catchment has an overlap of 0.
pub fn check_aoi_overlap(
    collection: &FeatureCollection,
    aoi: &Bounds,
    aoi_crs: Crs,
    min_overlap_fraction: f64,
) -> Result<CheckResult> {
    if collection.crs().is_none() {
        return Ok(CheckResult::new(
            PolicyCheck::AoiOverlap,
            false,
            0.0,
            "Catchment has no CRS defined",
        ));
    }

    let projected = collection.reproject(aoi_crs)?;
    let catchment = union_all(projected.polygonal_features());
    let aoi_polygon = aoi.to_polygon();

    if !catchment.intersects(&aoi_polygon) {
        return Ok(CheckResult::new(
            PolicyCheck::AoiOverlap,
            false,
            0.0,
            "Catchment does not overlap with the area of interest",
        ));
    }

    let area = catchment.unsigned_area();
    let overlap = if area > 0.0 {
        intersection_area(&catchment, &aoi.to_rect()) / area
    } else {
        0.0
    };

    Ok(if overlap < min_overlap_fraction {
        CheckResult::new(
            PolicyCheck::AoiOverlap,
            false,
            overlap,
            format!(
                "Only {:.1}% of catchment overlaps with the area of interest (minimum: {:.1}%)",
                overlap * 100.0,
                min_overlap_fraction * 100.0
            ),
        )
    } else {
        CheckResult::new(
            PolicyCheck::AoiOverlap,
            true,
            overlap,
            format!(
                "Catchment overlaps {:.1}% with the area of interest",
                overlap * 100.0
            ),
        )
    })
}

/// Total feature area in km², measured in the planar `area_crs`
pub fn catchment_area_km2(collection: &FeatureCollection, area_crs: Crs) -> Result<f64> {
    let projected = collection.reproject(area_crs)?;
    let area_m2: f64 = projected
        .polygonal_features()
        .map(|mp| mp.unsigned_area())
        .sum();
    Ok(area_m2 / 1e6)
}

/// Require the catchment area to lie within `[min_km2, max_km2]`
///
/// A collection without a CRS fails with a measured area of 0.
pub fn check_catchment_size(
    collection: &FeatureCollection,
    area_crs: Crs,
    min_km2: f64,
    max_km2: f64,
) -> Result<CheckResult> {
    if collection.crs().is_none() {
        return Ok(CheckResult::new(
            PolicyCheck::CatchmentSize,
            false,
            0.0,
            "Catchment has no CRS defined",
        ));
    }

    let area_km2 = catchment_area_km2(collection, area_crs)?;

    Ok(if area_km2 < min_km2 {
        CheckResult::new(
            PolicyCheck::CatchmentSize,
            false,
            area_km2,
            format!("Catchment area ({area_km2:.4} km²) is below minimum ({min_km2} km²)"),
        )
    } else if area_km2 > max_km2 {
        CheckResult::new(
            PolicyCheck::CatchmentSize,
            false,
            area_km2,
            format!("Catchment area ({area_km2:.0} km²) exceeds maximum ({max_km2} km²)"),
        )
    } else {
        CheckResult::new(
            PolicyCheck::CatchmentSize,
            true,
            area_km2,
            format!("Catchment area: {area_km2:.2} km²"),
        )
    })
}

/// Run every check enabled by `policy`
///
/// The feature count is always checked; AOI overlap and size follow the
/// policy switches. Never mutates the collection.
pub fn validate(collection: &FeatureCollection, policy: &CatchmentPolicy) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    report.push(check_feature_count(collection, policy.max_features));

    if policy.validate_aoi {
        report.push(check_aoi_overlap(
            collection,
            &policy.aoi,
            policy.aoi_crs,
            policy.min_overlap_fraction,
        )?);
    }
    if policy.validate_size {
        report.push(check_catchment_size(
            collection,
            policy.area_crs,
            policy.min_area_km2,
            policy.max_area_km2,
        )?);
    }

    for entry in report.entries() {
        if entry.passed {
            info!(check = %entry.check, measured = entry.measured, "{}", entry.message);
        } else {
            warn!(check = %entry.check, measured = entry.measured, "{}", entry.message);
        }
    }
    Ok(report)
}
