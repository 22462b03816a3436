//! Centralized error handling for basin_grid
//!
//! Geometry, validation and domain failures are fatal for the catchment or
//! reduction that raised them and carry enough context for the caller to
//! adjust policy and retry. Spatial subsetting never reports an empty or
//! degraded selection as an error: see [`crate::subset::SubsetOutcome`].

use thiserror::Error;

/// Main error type for basin_grid operations
#[derive(Error, Debug)]
pub enum BasinGridError {
    /// Unrecognized, empty or otherwise unusable geometry input
    #[error("Geometry error: {0}")]
    GeometryError(String),

    /// A catchment policy check failed
    #[error("Validation failed [{check}] (measured {measured}): {message}")]
    ValidationError {
        check: String,
        measured: f64,
        message: String,
    },

    /// A reduction precondition does not hold (e.g. all weights are zero)
    #[error("Domain error: {0}")]
    DomainError(String),

    /// Unknown or unsupported coordinate reference system, or a failed transform
    #[error("CRS error: {0}")]
    CrsError(String),

    /// Bounding box with min >= max or a malformed extent
    #[error("Invalid bounds: {message}")]
    InvalidBounds { message: String },

    /// Coordinate axis that is empty, non-finite or not strictly monotonic
    #[error("Invalid axis '{axis}': {message}")]
    InvalidAxis { axis: String, message: String },

    /// No axis matching any of the recognized names
    #[error("Axis not found: expected one of {candidates:?}")]
    AxisNotFound { candidates: Vec<String> },

    /// Data layer not present in the dataset
    #[error("Layer '{layer}' not found in dataset")]
    LayerNotFound { layer: String },

    /// Array shapes that should agree do not
    #[error("Shape mismatch for '{what}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Invalid settings or CLI values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Catalog has no entry for the requested dataset
    #[error("Dataset not found: {category}/{subcategory}")]
    DatasetNotFound {
        category: String,
        subcategory: String,
    },

    /// Time axis units or requested dates could not be interpreted
    #[error("Time axis error: {0}")]
    TimeError(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// JSON (GeoJSON, settings, download log) errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Malformed GeoJSON documents
    #[error("GeoJSON error: {0}")]
    GeoJsonError(#[from] geojson::Error),

    /// YAML (settings, catalog) errors
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl BasinGridError {
    /// Shorthand for a [`BasinGridError::GeometryError`]
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::GeometryError(message.into())
    }

    /// Shorthand for a [`BasinGridError::CrsError`]
    pub fn crs(message: impl Into<String>) -> Self {
        Self::CrsError(message.into())
    }

    /// Shorthand for a [`BasinGridError::InvalidAxis`]
    pub fn invalid_axis(axis: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAxis {
            axis: axis.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for basin_grid operations
pub type Result<T> = std::result::Result<T, BasinGridError>;
