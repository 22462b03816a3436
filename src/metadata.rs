//! Human-readable dataset summaries for the `inspect` command

use crate::grid::grid_resolution;
use crate::raster::{AxisKind, RasterDataset};
use crate::statistics::SeriesSummary;
use std::fmt;

/// Format a byte count with a binary unit
pub fn format_size(bytes: usize) -> String {
    let b = bytes as f64;
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.2} KB", b / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.2} MB", b / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", b / (1024.0 * 1024.0 * 1024.0))
    }
}

fn axis_role(name: &str) -> &'static str {
    if AxisKind::X.matches(name) {
        " (x)"
    } else if AxisKind::Y.matches(name) {
        " (y)"
    } else if AxisKind::Time.matches(name) {
        " (time)"
    } else {
        ""
    }
}

/// Axes, resolutions, layers and value ranges of a dataset
pub struct DatasetSummary<'a>(pub &'a RasterDataset);

impl fmt::Display for DatasetSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dataset = self.0;
        let crs = dataset
            .crs()
            .map_or_else(|| "undefined".to_string(), |c| c.to_string());
        writeln!(f, "CRS: {crs}")?;

        writeln!(f, "\nDimensions")?;
        writeln!(f, "==========")?;
        if dataset.axes().is_empty() {
            writeln!(f, "   (no dimensions)")?;
        }
        for axis in dataset.axes() {
            let values = axis.to_vec();
            write!(f, "    {}{} = {}", axis.name, axis_role(&axis.name), axis.len())?;
            if let (Some(first), Some(last)) = (values.first(), values.last()) {
                write!(
                    f,
                    "  [{first} .. {last}], step {}",
                    grid_resolution(&values, f64::NAN)
                )?;
            }
            if let Some(units) = &axis.units {
                write!(f, "  ({units})")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\nLayers")?;
        writeln!(f, "======")?;
        if dataset.layers().is_empty() {
            writeln!(f, "   (no layers)")?;
        }
        for layer in dataset.layers() {
            let shape: Vec<String> = layer.data.shape().iter().map(usize::to_string).collect();
            writeln!(
                f,
                "    {}: [{}] = ({}), {}",
                layer.name,
                layer.dims.join(", "),
                shape.join(" x "),
                format_size(layer.data.len() * std::mem::size_of::<f32>())
            )?;
            let values: Vec<f64> = layer.data.iter().map(|&v| f64::from(v)).collect();
            let summary = SeriesSummary::from_values(values.iter());
            write!(f, "      └─ {summary}")?;
            if let Some(units) = &layer.units {
                write!(f, ", units: {units}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn describe_dataset(dataset: &RasterDataset) -> String {
    DatasetSummary(dataset).to_string()
}
