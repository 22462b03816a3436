//! Exact intersection areas between polygons and axis-aligned rectangles
//!
//! Each ring is clipped against the rectangle (Sutherland-Hodgman against
//! the four half-planes) and its shoelace area taken. The clip window is
//! convex, so concave rings come out with zero-width connecting edges along
//! the window boundary, which contribute no area.

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl Edge {
    fn inside(self, p: Coord<f64>) -> bool {
        match self {
            Edge::Left(x) => p.x >= x,
            Edge::Right(x) => p.x <= x,
            Edge::Bottom(y) => p.y >= y,
            Edge::Top(y) => p.y <= y,
        }
    }

    // Only called when `a` and `b` lie on opposite sides of the edge.
    fn crossing(self, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
        match self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a.x) / (b.x - a.x);
                Coord {
                    x,
                    y: a.y + t * (b.y - a.y),
                }
            }
            Edge::Bottom(y) | Edge::Top(y) => {
                let t = (y - a.y) / (b.y - a.y);
                Coord {
                    x: a.x + t * (b.x - a.x),
                    y,
                }
            }
        }
    }
}

fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut coords: Vec<Coord<f64>> = ring.coords().copied().collect();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

fn clip_ring(ring: &LineString<f64>, rect: &Rect<f64>) -> Vec<Coord<f64>> {
    let edges = [
        Edge::Left(rect.min().x),
        Edge::Right(rect.max().x),
        Edge::Bottom(rect.min().y),
        Edge::Top(rect.max().y),
    ];

    let mut output = open_ring(ring);
    for edge in edges {
        let input = std::mem::take(&mut output);
        let Some(&last) = input.last() else {
            break;
        };
        let mut prev = last;
        for &current in &input {
            let current_inside = edge.inside(current);
            if current_inside {
                if !edge.inside(prev) {
                    output.push(edge.crossing(prev, current));
                }
                output.push(current);
            } else if edge.inside(prev) {
                output.push(edge.crossing(prev, current));
            }
            prev = current;
        }
    }
    output
}

/// Absolute shoelace area of an open ring
fn ring_area(points: &[Coord<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let origin = points[0];
    let twice_area: f64 = points
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0] - origin, w[1] - origin);
            a.x * b.y - b.x * a.y
        })
        .sum();
    (twice_area / 2.0).abs()
}

fn polygon_rect_area(polygon: &Polygon<f64>, rect: &Rect<f64>) -> f64 {
    let outer = ring_area(&clip_ring(polygon.exterior(), rect));
    if outer == 0.0 {
        return 0.0;
    }
    let holes: f64 = polygon
        .interiors()
        .iter()
        .map(|ring| ring_area(&clip_ring(ring, rect)))
        .sum();
    (outer - holes).max(0.0)
}

fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x < b.max().x && b.min().x < a.max().x && a.min().y < b.max().y && b.min().y < a.max().y
}

/// Area of `polygon ∩ rect` for a single polygon
#[must_use]
pub fn rect_intersection_area(polygon: &Polygon<f64>, rect: &Rect<f64>) -> f64 {
    match polygon.bounding_rect() {
        Some(bbox) if rects_overlap(&bbox, rect) => polygon_rect_area(polygon, rect),
        _ => 0.0,
    }
}

/// Area of `polygons ∩ rect`; member polygons are assumed not to overlap
#[must_use]
pub fn intersection_area(polygons: &MultiPolygon<f64>, rect: &Rect<f64>) -> f64 {
    polygons
        .iter()
        .map(|p| rect_intersection_area(p, rect))
        .sum()
}
