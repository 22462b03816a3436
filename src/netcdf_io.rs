//! NetCDF reading and writing for raster datasets and weight grids
//!
//! One-dimensional variables named after their dimension are read as
//! coordinate axes; every other numeric variable becomes an `f32` layer with
//! `_FillValue` entries replaced by NaN.

use crate::crs::Crs;
use crate::errors::Result;
use crate::raster::{CoordinateAxis, DataLayer, RasterDataset};
use crate::weights::WeightGrid;
use chrono::Utc;
use ndarray::{Array1, ArrayD};
use netcdf::{AttributeValue, Variable};
use std::{fs, path::Path};
use tracing::{debug, info, warn};

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn fill_value(var: &Variable) -> Option<f32> {
    var.attribute("_FillValue")
        .and_then(|attr| match attr.value().ok()? {
            AttributeValue::Float(v) => Some(v),
            AttributeValue::Double(v) => Some(v as f32),
            AttributeValue::Short(v) => Some(f32::from(v)),
            AttributeValue::Int(v) => Some(v as f32),
            _ => None,
        })
}

/// Read every coordinate axis and numeric layer of a NetCDF file
pub fn read_dataset(path: &Path) -> Result<RasterDataset> {
    let file = netcdf::open(path)?;
    info!(path = %path.display(), "opening NetCDF dataset");

    let mut axes = Vec::new();
    for dim in file.dimensions() {
        let name = dim.name();
        let axis = match file.variable(&name) {
            Some(var) if var.dimensions().len() == 1 => {
                let values: Vec<f64> = var.get_values::<f64, _>(..)?;
                let mut axis = CoordinateAxis::new(name.clone(), values);
                axis.units = string_attribute(&var, "units");
                axis
            }
            _ => CoordinateAxis::new(
                name.clone(),
                Array1::from_iter((0..dim.len()).map(|i| i as f64)),
            ),
        };
        axes.push(axis);
    }

    let mut layers = Vec::new();
    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        if dims.is_empty() || (dims.len() == 1 && dims[0] == name) {
            continue;
        }
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values = match var.get_values::<f32, _>(..) {
            Ok(values) => values,
            Err(e) => {
                debug!(variable = %name, error = %e, "skipping non-numeric variable");
                continue;
            }
        };
        let mut data = ArrayD::from_shape_vec(shape, values)?;
        if let Some(fv) = fill_value(&var) {
            data.mapv_inplace(|v| if v == fv { f32::NAN } else { v });
        }
        layers.push(DataLayer {
            name,
            dims,
            data,
            units: string_attribute(&var, "units"),
        });
    }

    let crs = file.attribute("crs").and_then(|attr| match attr.value().ok()? {
        AttributeValue::Str(s) => match s.parse::<Crs>() {
            Ok(crs) => Some(crs),
            Err(e) => {
                warn!(crs = %s, error = %e, "ignoring unrecognized dataset CRS");
                None
            }
        },
        _ => None,
    });

    RasterDataset::new(axes, layers, crs)
}

/// Unified NetCDF writer for datasets and weight grids
pub struct NetCdfWriter<'a> {
    output_path: &'a Path,
}

impl<'a> NetCdfWriter<'a> {
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    fn create(&self) -> Result<netcdf::FileMut> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        if let Some(parent) = self.output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(netcdf::create(self.output_path)?)
    }

    fn put_axis(file: &mut netcdf::FileMut, axis: &CoordinateAxis) -> Result<()> {
        let mut var = file.add_variable::<f64>(&axis.name, &[axis.name.as_str()])?;
        if let Some(units) = &axis.units {
            var.put_attribute("units", units.as_str())?;
        }
        var.put(axis.values.view(), ..)?;
        Ok(())
    }

    fn stamp(file: &mut netcdf::FileMut, crs: Option<Crs>) -> Result<()> {
        if let Some(crs) = crs {
            file.add_attribute("crs", crs.to_string())?;
        }
        file.add_attribute(
            "history",
            format!("Created by basingrid on {}", Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    /// Write all axes and layers of `dataset`
    pub fn write_dataset(&self, dataset: &RasterDataset) -> Result<()> {
        let mut file = self.create()?;

        for axis in dataset.axes() {
            file.add_dimension(&axis.name, axis.len())?;
        }
        for axis in dataset.axes() {
            Self::put_axis(&mut file, axis)?;
        }

        for layer in dataset.layers() {
            let dim_refs: Vec<&str> = layer.dims.iter().map(String::as_str).collect();
            let mut var = file.add_variable::<f32>(&layer.name, &dim_refs)?;
            var.put_attribute("_FillValue", f32::NAN)?;
            if let Some(units) = &layer.units {
                var.put_attribute("units", units.as_str())?;
            }
            var.put(layer.data.view(), ..)?;
        }

        Self::stamp(&mut file, dataset.crs())?;
        info!(path = %self.output_path.display(), layers = dataset.layers().len(), "dataset written");
        Ok(())
    }

    /// Write a weight grid as a `weights` variable over its lat/lon axes
    pub fn write_weights(&self, weights: &WeightGrid, crs: Option<Crs>) -> Result<()> {
        let mut file = self.create()?;
        let lat = CoordinateAxis::new(weights.lat_name.clone(), weights.lat.clone());
        let lon = CoordinateAxis::new(weights.lon_name.clone(), weights.lon.clone());

        file.add_dimension(&lat.name, lat.len())?;
        file.add_dimension(&lon.name, lon.len())?;
        Self::put_axis(&mut file, &lat)?;
        Self::put_axis(&mut file, &lon)?;

        let mut var = file.add_variable::<f64>("weights", &[lat.name.as_str(), lon.name.as_str()])?;
        var.put_attribute("long_name", "fraction of grid cell covered by catchment")?;
        var.put(weights.weights.view(), ..)?;

        file.add_attribute("nonzero_cells", weights.nonzero_cells as i64)?;
        file.add_attribute("effective_cells", weights.effective_cells)?;
        Self::stamp(&mut file, crs)?;
        info!(path = %self.output_path.display(), "weight grid written");
        Ok(())
    }
}

/// Write a dataset to `path`, replacing any existing file
pub fn write_dataset(dataset: &RasterDataset, path: &Path) -> Result<()> {
    NetCdfWriter::new(path).write_dataset(dataset)
}

/// Write a weight grid to `path`, replacing any existing file
pub fn write_weights(weights: &WeightGrid, crs: Option<Crs>, path: &Path) -> Result<()> {
    NetCdfWriter::new(path).write_weights(weights, crs)
}
