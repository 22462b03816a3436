//! Dataset catalog: `category -> subcategory -> dataset`

use crate::crs::Crs;
use crate::errors::{BasinGridError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One downloadable dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Store-relative location
    pub path: String,
    /// CRS of the dataset's spatial axes
    pub crs: Crs,
    /// Whether the dataset has a time axis worth subsetting
    #[serde(default)]
    pub temporal: bool,
    #[serde(default)]
    pub description: String,
    /// Primary variable, when the dataset has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
}

/// All datasets, ordered by category then subcategory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetCatalog {
    entries: BTreeMap<String, BTreeMap<String, DatasetInfo>>,
}

impl DatasetCatalog {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BasinGridError::ConfigError(format!(
                "dataset catalog not found: {}",
                path.display()
            )));
        }
        Self::from_yaml_str(&fs::read_to_string(path)?)
    }

    pub fn insert(&mut self, category: &str, subcategory: &str, info: DatasetInfo) {
        self.entries
            .entry(category.to_string())
            .or_default()
            .insert(subcategory.to_string(), info);
    }

    pub fn get(&self, category: &str, subcategory: &str) -> Result<&DatasetInfo> {
        self.entries
            .get(category)
            .and_then(|subs| subs.get(subcategory))
            .ok_or_else(|| BasinGridError::DatasetNotFound {
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            })
    }

    /// `(category, subcategory, info)` for every entry
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &DatasetInfo)> {
        self.entries.iter().flat_map(|(category, subs)| {
            subs.iter()
                .map(move |(sub, info)| (category.as_str(), sub.as_str(), info))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
