//! Axis-aligned bounding boxes

use crate::errors::{BasinGridError, Result};
use geo::{coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// `(min_x, min_y, max_x, max_y)` in the units of some CRS
///
/// Always satisfies `min_x < max_x` and `min_y < max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    /// Create bounds, rejecting empty, inverted or non-finite boxes
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        if [min_x, min_y, max_x, max_y].iter().any(|v| !v.is_finite()) {
            return Err(BasinGridError::InvalidBounds {
                message: format!("non-finite value in ({min_x}, {min_y}, {max_x}, {max_y})"),
            });
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(BasinGridError::InvalidBounds {
                message: format!(
                    "min values must be less than max values, got ({min_x}, {min_y}, {max_x}, {max_y})"
                ),
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Create bounds from a `[minx, miny, maxx, maxy]` slice
    pub fn from_extent(extent: &[f64]) -> Result<Self> {
        match extent {
            [min_x, min_y, max_x, max_y] => Self::new(*min_x, *min_y, *max_x, *max_y),
            _ => Err(BasinGridError::InvalidBounds {
                message: format!(
                    "extent must have 4 values [minx, miny, maxx, maxy], got {}",
                    extent.len()
                ),
            }),
        }
    }

    /// Default area of interest: continental Europe in EPSG:4326
    #[must_use]
    pub const fn europe() -> Self {
        Self {
            min_x: -25.0,
            min_y: 35.0,
            max_x: 70.0,
            max_y: 72.0,
        }
    }

    /// Bounds of a `geo` rectangle; `None` for degenerate rectangles
    #[must_use]
    pub fn from_rect(rect: &Rect<f64>) -> Option<Self> {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y).ok()
    }

    #[must_use]
    pub const fn min_x(&self) -> f64 {
        self.min_x
    }

    #[must_use]
    pub const fn min_y(&self) -> f64 {
        self.min_y
    }

    #[must_use]
    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    #[must_use]
    pub const fn max_y(&self) -> f64 {
        self.max_y
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow the box by `dx` on the left and right and `dy` on the top and bottom.
    /// Negative or non-finite amounts are ignored.
    #[must_use]
    pub fn expand(&self, dx: f64, dy: f64) -> Self {
        let dx = if dx.is_finite() { dx.max(0.0) } else { 0.0 };
        let dy = if dy.is_finite() { dy.max(0.0) } else { 0.0 };
        Self {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
    }

    #[must_use]
    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }

    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl TryFrom<[f64; 4]> for Bounds {
    type Error = BasinGridError;

    fn try_from(value: [f64; 4]) -> Result<Self> {
        Self::from_extent(&value)
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(bounds: Bounds) -> Self {
        bounds.to_array()
    }
}
