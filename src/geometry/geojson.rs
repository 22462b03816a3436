//! Reading catchment features from GeoJSON
//!
//! Accepts a `FeatureCollection`, a single `Feature` or a bare geometry
//! object. The legacy `crs` member (`{"type": "name", "properties": {"name":
//! ...}}`) is honoured; without it coordinates are EPSG:4326 (RFC 7946).

use super::{FeatureCollection, Geometry};
use crate::crs::Crs;
use crate::errors::{BasinGridError, Result};
use ::geojson::{GeoJson, JsonObject, Value};
use geo::LineString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Debug, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

fn legacy_crs(members: Option<&JsonObject>) -> Result<Crs> {
    match members.and_then(|m| m.get("crs")) {
        Some(raw) if !raw.is_null() => {
            let named: NamedCrs = serde_json::from_value(raw.clone())?;
            named.properties.name.parse()
        }
        _ => Ok(Crs::WGS84),
    }
}

// Positions shorter than (x, y) would make the geo-types conversion index out of bounds.
fn check_positions(value: &Value) -> Result<()> {
    let check = |position: &Vec<f64>| {
        if position.len() < 2 {
            return Err(BasinGridError::geometry(format!(
                "invalid GeoJSON position {position:?}"
            )));
        }
        Ok(())
    };
    match value {
        Value::Point(p) => check(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().try_for_each(check),
        Value::MultiLineString(rings) | Value::Polygon(rings) => {
            rings.iter().flatten().try_for_each(check)
        }
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().try_for_each(check),
        Value::GeometryCollection(members) => {
            members.iter().try_for_each(|g| check_positions(&g.value))
        }
    }
}

fn convert(geometry: ::geojson::Geometry) -> Result<Geometry> {
    check_positions(&geometry.value)?;
    let converted = geo::Geometry::<f64>::try_from(geometry)
        .map_err(|e| BasinGridError::geometry(format!("malformed GeoJSON geometry: {e}")))?;

    Ok(match converted {
        geo::Geometry::Point(p) => Geometry::Point(p),
        geo::Geometry::MultiPoint(mp) => Geometry::MultiPoint(mp),
        geo::Geometry::LineString(ls) => Geometry::Line(ls),
        geo::Geometry::Line(l) => Geometry::Line(LineString::new(vec![l.start, l.end])),
        geo::Geometry::MultiLineString(mls) => Geometry::MultiLine(mls),
        geo::Geometry::Polygon(p) => Geometry::Polygon(p),
        geo::Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp),
        geo::Geometry::Rect(r) => Geometry::Polygon(r.to_polygon()),
        geo::Geometry::Triangle(t) => Geometry::Polygon(t.to_polygon()),
        geo::Geometry::GeometryCollection(_) => {
            Geometry::Unsupported("GeometryCollection".to_string())
        }
    })
}

/// Parse a GeoJSON document into a feature collection
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let document = GeoJson::from_str(text)?;

    let (geometries, crs) = match document {
        GeoJson::FeatureCollection(fc) => {
            let crs = legacy_crs(fc.foreign_members.as_ref())?;
            let geometries: Vec<Option<::geojson::Geometry>> =
                fc.features.into_iter().map(|f| f.geometry).collect();
            (geometries, crs)
        }
        GeoJson::Feature(feature) => {
            let crs = legacy_crs(feature.foreign_members.as_ref())?;
            (vec![feature.geometry], crs)
        }
        GeoJson::Geometry(geometry) => {
            let crs = legacy_crs(geometry.foreign_members.as_ref())?;
            (vec![Some(geometry)], crs)
        }
    };

    let mut features = Vec::with_capacity(geometries.len());
    for geometry in geometries {
        match geometry {
            Some(geometry) => features.push(convert(geometry)?),
            None => debug!("skipping feature with null geometry"),
        }
    }

    Ok(FeatureCollection::new(features, Some(crs)))
}

/// Read a GeoJSON file into a feature collection
pub fn read_geojson(path: &Path) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path)?;
    parse_geojson(&text)
}
