//! basin_grid: catchment-aware extraction and averaging of gridded datasets
//!
//! A Rust library for preparing hydrological catchments and applying them
//! to gridded climate and hydrology data. Catchments are read from GeoJSON or
//! an explicit extent, normalized into a single polygon, checked against a
//! configurable policy, and then used to weight grid cells, subset datasets
//! and compute area-weighted basin averages.
//!
//! ## Key Features
//!
//! - **Catchment Normalization**: Points and lines are buffered into polygons, multiple features merged
//! - **Policy Validation**: Feature count, area-of-interest overlap and size checks with a full report
//! - **Cell Weights**: Exact fractional cell coverage computed in parallel with Rayon
//! - **Spatial Subsetting**: Buffered bounding box selection with a fallback window and optional clipping
//! - **Basin Averages**: Area-weighted scalars or time series, plus anomaly statistics
//! - **Catalog Downloads**: Batch extraction of catalog datasets with a JSON download log
//!
//! ## Module Organization
//!
//! - [`crs`]: EPSG coordinate reference systems and transformations
//! - [`geometry`]: geometry model, classification, buffering, merging and GeoJSON input
//! - [`catchment`]: the catchment loading pipeline
//! - [`validation`]: catchment policy checks
//! - [`config`]: policy, subsetting and runtime settings
//! - [`raster`]: in-memory gridded datasets
//! - [`grid`]: grid axes and resolution estimation
//! - [`weights`]: catchment weight grids
//! - [`subset`]: spatial subsetting
//! - [`temporal`]: CF time decoding and time-window subsetting
//! - [`statistics`]: basin averages and anomalies
//! - [`netcdf_io`]: NetCDF reading and writing
//! - [`metadata`]: dataset summaries
//! - [`catalog`], [`data_source`], [`downloader`]: catalog-driven extraction
//! - [`parallel`]: Rayon thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use basin_grid::prelude::*;
//!
//! let source = CatchmentSource::Extent {
//!     extent: vec![9.75, 49.75, 10.25, 50.25],
//!     crs: Crs::WGS84,
//! };
//! let catchment = load_catchment(&source, None, &CatchmentPolicy::default()).unwrap();
//!
//! let dataset = basin_grid::netcdf_io::read_dataset("precip.nc".as_ref()).unwrap();
//! let weights = compute_dataset_weights(&dataset, &catchment).unwrap();
//! let average = basin_average(&dataset, "precip", &weights).unwrap();
//! println!("{average:?}");
//! ```

pub mod catalog;
pub mod catchment;
pub mod config;
pub mod crs;
pub mod data_source;
pub mod downloader;
pub mod errors;
pub mod geometry;
pub mod grid;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod raster;
pub mod statistics;
pub mod subset;
pub mod temporal;
pub mod validation;
pub mod weights;

pub use errors::{BasinGridError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::catalog::{DatasetCatalog, DatasetInfo};
    pub use crate::catchment::{
        load_catchment, prepare_catchment, validate_preloaded, Catchment, CatchmentSource,
        PreparedCatchment, Provenance,
    };
    pub use crate::config::{CatchmentPolicy, Settings, SubsetOptions};
    pub use crate::crs::Crs;
    pub use crate::data_source::{LocalNetcdfStore, RasterSink, RasterSource};
    pub use crate::downloader::{build_dataset_path, Downloader};
    pub use crate::errors::{BasinGridError, Result};
    pub use crate::geometry::{Bounds, FeatureCollection, Geometry, GeometryClass};
    pub use crate::grid::{grid_resolution, Grid};
    pub use crate::parallel::{ParallelConfig, ParallelInfo};
    pub use crate::raster::{AxisKind, CoordinateAxis, DataLayer, RasterDataset};
    pub use crate::statistics::{basin_average, compute_anomalies, BasinAverage, TimeSeries};
    pub use crate::subset::{spatial_subset, SubsetOutcome, SubsetResult};
    pub use crate::temporal::{temporal_subset, TimeRange};
    pub use crate::validation::{validate, ValidationReport};
    pub use crate::weights::{compute_catchment_weights, compute_dataset_weights, WeightGrid};
}
