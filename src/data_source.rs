//! Storage seams for raster datasets
//!
//! [`RasterSource`] is where catalog datasets are read from (a blob store in
//! production) and [`RasterSink`] is where subsets are written.
//! [`LocalNetcdfStore`] implements both over a local directory of NetCDF
//! files.

use crate::errors::{BasinGridError, Result};
use crate::netcdf_io::{read_dataset, write_dataset};
use crate::raster::RasterDataset;
use std::path::{Path, PathBuf};
use tracing::info;

/// Read access to datasets by store-relative path
pub trait RasterSource {
    fn open(&self, path: &str) -> Result<RasterDataset>;
}

/// Write access for finished datasets
pub trait RasterSink {
    /// File extension of written datasets, without the dot
    fn extension(&self) -> &'static str;

    fn write(&self, dataset: &RasterDataset, output: &Path) -> Result<()>;
}

/// NetCDF files under a root directory
#[derive(Debug, Clone)]
pub struct LocalNetcdfStore {
    root: PathBuf,
}

impl LocalNetcdfStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/path`, trying a `.nc` suffix when the bare path is missing
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let direct = self.root.join(path);
        if direct.is_file() {
            return Ok(direct);
        }
        let with_ext = direct.with_extension("nc");
        if with_ext.is_file() {
            return Ok(with_ext);
        }
        Err(BasinGridError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("dataset not found in store: {}", direct.display()),
        )))
    }
}

impl RasterSource for LocalNetcdfStore {
    fn open(&self, path: &str) -> Result<RasterDataset> {
        let resolved = self.resolve(path)?;
        info!(path = %resolved.display(), "opening dataset");
        read_dataset(&resolved)
    }
}

impl RasterSink for LocalNetcdfStore {
    fn extension(&self) -> &'static str {
        "nc"
    }

    fn write(&self, dataset: &RasterDataset, output: &Path) -> Result<()> {
        write_dataset(dataset, output)
    }
}
