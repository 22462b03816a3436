//! In-memory raster datasets: named coordinate axes plus named data layers
//!
//! Axes are resolved by name, never by position. Spatial and temporal axes
//! may carry any of the usual synonyms (see [`AxisKind`]).

use crate::crs::Crs;
use crate::errors::{BasinGridError, Result};
use ndarray::{Array1, ArrayD, Axis};
use std::collections::HashSet;

/// Role of a coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisKind {
    X,
    Y,
    Time,
}

impl AxisKind {
    /// Recognized names, in lookup order
    pub const fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::X => &["x", "lon", "longitude"],
            Self::Y => &["y", "lat", "latitude"],
            Self::Time => &["time", "date", "t"],
        }
    }

    pub fn matches(self, name: &str) -> bool {
        self.synonyms()
            .iter()
            .any(|s| s.eq_ignore_ascii_case(name))
    }

    fn not_found(self) -> BasinGridError {
        BasinGridError::AxisNotFound {
            candidates: self.synonyms().iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A 1-D coordinate variable
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateAxis {
    pub name: String,
    pub values: Array1<f64>,
    pub units: Option<String>,
}

impl CoordinateAxis {
    pub fn new(name: impl Into<String>, values: impl Into<Array1<f64>>) -> Self {
        Self {
            name: name.into(),
            values: values.into(),
            units: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}

/// A named data variable laid out over named dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct DataLayer {
    pub name: String,
    pub dims: Vec<String>,
    pub data: ArrayD<f32>,
    pub units: Option<String>,
}

impl DataLayer {
    pub fn new(name: impl Into<String>, dims: &[&str], data: ArrayD<f32>) -> Self {
        Self {
            name: name.into(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data,
            units: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Position of a dimension in this layer
    pub fn dim_index(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dim_index(dim).is_some()
    }
}

/// A set of data layers sharing coordinate axes
#[derive(Debug, Clone, PartialEq)]
pub struct RasterDataset {
    axes: Vec<CoordinateAxis>,
    layers: Vec<DataLayer>,
    crs: Option<Crs>,
}

impl RasterDataset {
    /// Build a dataset, checking each layer against the axes it names
    pub fn new(axes: Vec<CoordinateAxis>, layers: Vec<DataLayer>, crs: Option<Crs>) -> Result<Self> {
        let mut seen = HashSet::new();
        for axis in &axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(BasinGridError::invalid_axis(
                    &axis.name,
                    "duplicate coordinate axis",
                ));
            }
        }

        for layer in &layers {
            if layer.dims.len() != layer.data.ndim() {
                return Err(BasinGridError::ShapeMismatch {
                    what: format!("dimensions of layer '{}'", layer.name),
                    expected: vec![layer.dims.len()],
                    found: vec![layer.data.ndim()],
                });
            }
            let expected = layer
                .dims
                .iter()
                .map(|d| {
                    axes.iter()
                        .find(|a| &a.name == d)
                        .map(CoordinateAxis::len)
                        .ok_or_else(|| {
                            BasinGridError::invalid_axis(
                                d,
                                format!("layer '{}' uses an undefined dimension", layer.name),
                            )
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            if expected != layer.data.shape() {
                return Err(BasinGridError::ShapeMismatch {
                    what: format!("layer '{}'", layer.name),
                    expected,
                    found: layer.data.shape().to_vec(),
                });
            }
        }

        Ok(Self { axes, layers, crs })
    }

    pub fn axes(&self) -> &[CoordinateAxis] {
        &self.axes
    }

    pub fn layers(&self) -> &[DataLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DataLayer] {
        &mut self.layers
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    pub fn into_parts(self) -> (Vec<CoordinateAxis>, Vec<DataLayer>, Option<Crs>) {
        (self.axes, self.layers, self.crs)
    }

    pub fn axis(&self, name: &str) -> Option<&CoordinateAxis> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// First axis whose name is a synonym of `kind`
    pub fn find_axis(&self, kind: AxisKind) -> Option<&CoordinateAxis> {
        kind.synonyms().iter().find_map(|s| {
            self.axes
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(s))
        })
    }

    pub fn require_axis(&self, kind: AxisKind) -> Result<&CoordinateAxis> {
        self.find_axis(kind).ok_or_else(|| kind.not_found())
    }

    pub fn layer(&self, name: &str) -> Result<&DataLayer> {
        self.layers
            .iter()
            .find(|l| l.name == name)
            .ok_or_else(|| BasinGridError::LayerNotFound {
                layer: name.to_string(),
            })
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Keep only the given positions along one axis, in the given order
    pub fn select_indices(&self, axis_name: &str, indices: &[usize]) -> Result<Self> {
        let axis = self.axis(axis_name).ok_or_else(|| {
            BasinGridError::invalid_axis(axis_name, "no such coordinate axis")
        })?;
        if let Some(&bad) = indices.iter().find(|&&i| i >= axis.len()) {
            return Err(BasinGridError::invalid_axis(
                axis_name,
                format!("index {bad} out of range for length {}", axis.len()),
            ));
        }

        let axes = self
            .axes
            .iter()
            .map(|a| {
                if a.name == axis_name {
                    CoordinateAxis {
                        values: a.values.select(Axis(0), indices),
                        ..a.clone()
                    }
                } else {
                    a.clone()
                }
            })
            .collect();

        let layers = self
            .layers
            .iter()
            .map(|l| match l.dim_index(axis_name) {
                Some(k) => DataLayer {
                    data: l.data.select(Axis(k), indices),
                    ..l.clone()
                },
                None => l.clone(),
            })
            .collect();

        Ok(Self {
            axes,
            layers,
            crs: self.crs,
        })
    }

    /// Rename an axis and every layer dimension referring to it
    pub fn rename_axis(mut self, from: &str, to: &str) -> Result<Self> {
        if from == to {
            return Ok(self);
        }
        if self.axis(to).is_some() {
            return Err(BasinGridError::invalid_axis(to, "axis name already in use"));
        }
        let axis = self
            .axes
            .iter_mut()
            .find(|a| a.name == from)
            .ok_or_else(|| BasinGridError::invalid_axis(from, "no such coordinate axis"))?;
        axis.name = to.to_string();

        for layer in &mut self.layers {
            for dim in &mut layer.dims {
                if dim == from {
                    *dim = to.to_string();
                }
            }
        }
        Ok(self)
    }

    pub fn retain_layers<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&DataLayer) -> bool,
    {
        self.layers.retain(keep);
        self
    }

    /// Keep only the named layers; each must exist
    pub fn select_layers<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let layers = names
            .iter()
            .map(|n| self.layer(n.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            axes: self.axes.clone(),
            layers,
            crs: self.crs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn sample() -> RasterDataset {
        let data = Array::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f32).into_dyn();
        RasterDataset::new(
            vec![
                CoordinateAxis::new("latitude", vec![50.0, 51.0]),
                CoordinateAxis::new("longitude", vec![10.0, 11.0, 12.0]),
            ],
            vec![DataLayer::new("tas", &["latitude", "longitude"], data)],
            None,
        )
        .unwrap()
    }

    #[test]
    fn axes_resolve_by_synonym() {
        let ds = sample();
        assert_eq!(ds.find_axis(AxisKind::Y).unwrap().name, "latitude");
        assert_eq!(ds.find_axis(AxisKind::X).unwrap().name, "longitude");
        assert!(ds.find_axis(AxisKind::Time).is_none());
    }

    #[test]
    fn selection_follows_layer_dimension_order() {
        let ds = sample().select_indices("longitude", &[2]).unwrap();
        let layer = ds.layer("tas").unwrap();
        assert_eq!(layer.data.shape(), &[2, 1]);
        assert_eq!(layer.data[[1, 0]], 5.0);
    }

    #[test]
    fn mismatched_layer_is_rejected() {
        let data = ArrayD::<f32>::zeros(vec![3, 3]);
        let result = RasterDataset::new(
            vec![
                CoordinateAxis::new("lat", vec![0.0, 1.0]),
                CoordinateAxis::new("lon", vec![0.0, 1.0, 2.0]),
            ],
            vec![DataLayer::new("v", &["lat", "lon"], data)],
            None,
        );
        assert!(matches!(result, Err(BasinGridError::ShapeMismatch { .. })));
    }
}
