//! Positive buffering of point and line geometries
//!
//! Buffers are built in a planar CRS: a point becomes a regular polygon
//! approximating a circle, a line becomes the union of one capsule per
//! segment. Results are reprojected back to the collection's CRS.

use super::{union_all, FeatureCollection, Geometry};
use crate::crs::{Crs, Transformer};
use crate::errors::{BasinGridError, Result};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use std::f64::consts::{FRAC_PI_2, PI};
use tracing::info;

/// Segments per quarter circle
pub const DEFAULT_QUADRANT_SEGMENTS: usize = 16;

fn arc(center: Coord<f64>, radius: f64, start: f64, sweep: f64, steps: usize) -> Vec<Coord<f64>> {
    (0..=steps)
        .map(|k| {
            let angle = start + sweep * k as f64 / steps as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect()
}

/// Regular polygon with `4 * quadrant_segments` vertices on a circle
#[must_use]
pub fn circle(center: Coord<f64>, radius: f64, quadrant_segments: usize) -> Polygon<f64> {
    let n = 4 * quadrant_segments.max(1);
    let mut ring = arc(center, radius, 0.0, 2.0 * PI, n);
    // the arc already ends on its first vertex; pin it exactly
    let first = ring[0];
    if let Some(last) = ring.last_mut() {
        *last = first;
    }
    Polygon::new(LineString::new(ring), Vec::new())
}

/// Stadium-shaped buffer around a single segment
#[must_use]
pub fn capsule(a: Coord<f64>, b: Coord<f64>, radius: f64, quadrant_segments: usize) -> Polygon<f64> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if dx.hypot(dy) <= f64::EPSILON * radius.max(1.0) {
        return circle(a, radius, quadrant_segments);
    }

    let heading = dy.atan2(dx);
    let steps = 2 * quadrant_segments.max(1);
    let mut ring = arc(b, radius, heading - FRAC_PI_2, PI, steps);
    ring.extend(arc(a, radius, heading + FRAC_PI_2, PI, steps));
    ring.push(ring[0]);
    Polygon::new(LineString::new(ring), Vec::new())
}

fn buffer_line(line: &LineString<f64>, distance: f64, quadrant_segments: usize) -> MultiPolygon<f64> {
    let coords: Vec<Coord<f64>> = line.coords().copied().collect();
    match coords.as_slice() {
        [] => MultiPolygon::new(Vec::new()),
        [only] => MultiPolygon::new(vec![circle(*only, distance, quadrant_segments)]),
        _ => union_all(
            coords
                .windows(2)
                .map(|w| MultiPolygon::new(vec![capsule(w[0], w[1], distance, quadrant_segments)])),
        ),
    }
}

fn buffer_points<'a, I>(points: I, distance: f64, quadrant_segments: usize) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a Point<f64>>,
{
    union_all(
        points
            .into_iter()
            .map(|p| MultiPolygon::new(vec![circle(p.0, distance, quadrant_segments)])),
    )
}

fn from_multi_polygon(mut mp: MultiPolygon<f64>) -> Geometry {
    if mp.0.len() == 1 {
        if let Some(p) = mp.0.pop() {
            return Geometry::Polygon(p);
        }
    }
    Geometry::MultiPolygon(mp)
}

/// Buffer one geometry by `distance` in its own (planar) units
///
/// Polygonal geometries are returned unchanged.
pub fn buffer_geometry(geometry: &Geometry, distance: f64, quadrant_segments: usize) -> Result<Geometry> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(BasinGridError::geometry(format!(
            "buffer distance must be positive, got {distance}"
        )));
    }

    let buffered = match geometry {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => return Ok(geometry.clone()),
        Geometry::Point(p) => buffer_points(std::iter::once(p), distance, quadrant_segments),
        Geometry::MultiPoint(mp) => buffer_points(mp.iter(), distance, quadrant_segments),
        Geometry::Line(ls) => buffer_line(ls, distance, quadrant_segments),
        Geometry::MultiLine(mls) => union_all(
            mls.iter()
                .map(|ls| buffer_line(ls, distance, quadrant_segments)),
        ),
        Geometry::Unsupported(name) => {
            return Err(BasinGridError::geometry(format!(
                "cannot buffer unsupported geometry type '{name}'"
            )))
        }
    };

    if buffered.0.is_empty() {
        return Err(BasinGridError::geometry(format!(
            "buffering an empty {} produced no polygon",
            geometry.type_name()
        )));
    }
    Ok(from_multi_polygon(buffered))
}

/// Buffer every feature in `planar` CRS units, then reproject back
///
/// Feeding a collection through `planar` and back without buffering is a
/// near-identity within projection tolerance, so only the buffer changes
/// the shape.
pub fn buffer_collection(
    collection: &FeatureCollection,
    distance: f64,
    planar: Crs,
) -> Result<FeatureCollection> {
    let original = collection
        .crs()
        .ok_or_else(|| BasinGridError::geometry("cannot buffer a collection without a CRS"))?;

    let projected = collection.reproject(planar)?;
    let buffered = projected
        .features()
        .iter()
        .map(|g| buffer_geometry(g, distance, DEFAULT_QUADRANT_SEGMENTS))
        .collect::<Result<Vec<_>>>()?;

    let back = Transformer::new(planar, original)?;
    let features = buffered
        .iter()
        .map(|g| g.reproject(&back))
        .collect::<Result<Vec<_>>>()?;

    info!(
        distance,
        planar_crs = %planar,
        features = features.len(),
        "buffered geometries"
    );
    Ok(FeatureCollection::new(features, Some(original)))
}
