//! Catalog-driven extraction of catchment subsets
//!
//! For each catalog entry the catchment is reprojected to the dataset CRS,
//! the dataset is opened from a [`RasterSource`], subset in space (and time
//! for temporal entries), written through a [`RasterSink`] under
//! `<base>/data/<category>/<subcategory>/` and recorded in
//! `<base>/logs/download_log.json`.

use crate::catalog::{DatasetCatalog, DatasetInfo};
use crate::catchment::{Catchment, Provenance};
use crate::config::SubsetOptions;
use crate::data_source::{RasterSink, RasterSource};
use crate::errors::Result;
use crate::subset::{spatial_subset, SubsetOutcome};
use crate::temporal::{temporal_subset, TimeRange};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// `<base>/data/<category>/<subcategory>/<subcategory>.<format>`
pub fn build_dataset_path(base: &Path, category: &str, subcategory: &str, format: &str) -> PathBuf {
    base.join("data")
        .join(category)
        .join(subcategory)
        .join(format!("{subcategory}.{}", format.to_lowercase()))
}

/// One line of the download history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLogEntry {
    pub timestamp: String,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub output_path: PathBuf,
    /// Catchment bounds in the dataset CRS
    pub bounds: [f64; 4],
    pub time_range: Option<TimeRange>,
    pub subset: SubsetOutcome,
    pub clipped: bool,
    pub catchment: Provenance,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadHistory {
    pub downloads: Vec<DownloadLogEntry>,
}

/// Outcome of one successful download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRecord {
    pub output_path: PathBuf,
    pub outcome: SubsetOutcome,
    pub clipped: bool,
}

/// Per-entry result of [`Downloader::download_all`]
#[derive(Debug)]
pub struct DownloadStatus {
    pub category: String,
    pub subcategory: String,
    pub result: Result<DownloadRecord>,
}

/// Extracts catalog datasets for one catchment
pub struct Downloader<S> {
    catalog: DatasetCatalog,
    catchment: Catchment,
    store: S,
    output_base: PathBuf,
    options: SubsetOptions,
}

impl<S: RasterSource + RasterSink> Downloader<S> {
    pub fn new(
        catalog: DatasetCatalog,
        catchment: Catchment,
        store: S,
        output_base: impl Into<PathBuf>,
        options: SubsetOptions,
    ) -> Self {
        Self {
            catalog,
            catchment,
            store,
            output_base: output_base.into(),
            options,
        }
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn log_file(&self) -> PathBuf {
        self.output_base.join("logs").join("download_log.json")
    }

    /// Previously logged downloads; empty when no log exists yet
    pub fn history(&self) -> Result<DownloadHistory> {
        let path = self.log_file();
        if !path.exists() {
            return Ok(DownloadHistory::default());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn append_log(&self, entry: DownloadLogEntry) -> Result<()> {
        let mut history = self.history()?;
        history.downloads.push(entry);
        let path = self.log_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&history)?)?;
        info!(path = %path.display(), "download logged");
        Ok(())
    }

    /// Extract one catalog entry
    ///
    /// `time_range` only applies to temporal entries. `variables` restricts
    /// the written layers.
    pub fn download_dataset(
        &self,
        category: &str,
        subcategory: &str,
        time_range: Option<&TimeRange>,
        variables: Option<&[String]>,
    ) -> Result<DownloadRecord> {
        let info: &DatasetInfo = self.catalog.get(category, subcategory)?;
        info!("starting download: {category} --> {subcategory}");

        let output_path =
            build_dataset_path(&self.output_base, category, subcategory, self.store.extension());

        let catchment = self.catchment.reproject(info.crs)?;
        let bounds = catchment.bounds()?;

        let mut dataset = self.store.open(&info.path)?;
        if dataset.crs().is_none() {
            dataset = dataset.with_crs(info.crs);
        }

        let subset = spatial_subset(&dataset, &bounds, Some(&catchment), &self.options)?;
        let (outcome, clipped) = (subset.outcome.clone(), subset.clipped);
        let mut result = subset.into_owned();

        let applied_range = match time_range {
            Some(range) if info.temporal => {
                result = temporal_subset(&result, range)?;
                Some(*range)
            }
            _ => None,
        };

        if let Some(names) = variables {
            result = result.select_layers(names)?;
        }

        info!(path = %output_path.display(), "writing output");
        self.store.write(&result, &output_path)?;

        self.append_log(DownloadLogEntry {
            timestamp: Local::now().to_rfc3339(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            description: info.description.clone(),
            output_path: output_path.clone(),
            bounds: bounds.to_array(),
            time_range: applied_range,
            subset: outcome.clone(),
            clipped,
            catchment: self.catchment.provenance().clone(),
        })?;

        info!(
            "download complete: {}",
            output_path
                .strip_prefix(&self.output_base)
                .unwrap_or(&output_path)
                .display()
        );
        Ok(DownloadRecord {
            output_path,
            outcome,
            clipped,
        })
    }

    /// Extract every catalog entry, continuing past failures
    pub fn download_all(&self, time_range: Option<&TimeRange>) -> Vec<DownloadStatus> {
        info!("starting batch download of {} datasets", self.catalog.len());
        let statuses: Vec<DownloadStatus> = self
            .catalog
            .iter()
            .map(|(category, subcategory, _)| {
                let result = self.download_dataset(category, subcategory, time_range, None);
                if let Err(e) = &result {
                    error!("failed to download {category}/{subcategory}: {e}");
                }
                DownloadStatus {
                    category: category.to_string(),
                    subcategory: subcategory.to_string(),
                    result,
                }
            })
            .collect();
        info!("batch download complete");
        statuses
    }
}
