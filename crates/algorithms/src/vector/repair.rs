//! Geometry validity checks and `buffer(0)`-style repair
//!
//! Repair handles the defects commonly found in cadastral exports:
//! non-finite coordinates, repeated vertices, unclosed or collapsed rings,
//! inconsistent ring orientation and overlapping multipolygon parts.
//! Overlapping parts also make a multipolygon invalid, so layer
//! preparation dissolves them before measuring area.
//! Self-intersections inside a single ring are left as they are.

use geo::orient::{Direction, Orient};
use geo::{
    Area, BooleanOps, BoundingRect, Coord, Intersects, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};

fn coord_is_finite(c: &Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite()
}

fn ring_is_valid(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4
        && ring.is_closed()
        && ring.0.iter().all(coord_is_finite)
}

fn polygon_is_valid(p: &Polygon<f64>) -> bool {
    ring_is_valid(p.exterior())
        && p.unsigned_area() > 0.0
        && p.interiors().iter().all(ring_is_valid)
}

/// Relative slack when comparing summed part areas with their union
const OVERLAP_TOLERANCE: f64 = 1e-9;

/// True when two or more parts share some area, so that summing part
/// areas would count the shared area more than once
fn parts_overlap(mp: &MultiPolygon<f64>) -> bool {
    if mp.0.len() < 2 {
        return false;
    }
    let rects: Vec<_> = mp.0.iter().map(|p| p.bounding_rect()).collect();
    let candidates = rects.iter().enumerate().any(|(i, a)| {
        rects[i + 1..]
            .iter()
            .any(|b| matches!((a, b), (Some(a), Some(b)) if a.intersects(b)))
    });
    if !candidates {
        return false;
    }
    let summed = mp.unsigned_area();
    let dissolved = dissolve_parts(mp.0.clone()).unsigned_area();
    summed - dissolved > summed * OVERLAP_TOLERANCE
}

/// Check whether a geometry is usable for area computation.
///
/// Coordinates must be finite. Polygon rings must be closed with at least
/// four positions, and every exterior must enclose a non-zero area.
/// Multipolygon parts must not overlap.
pub fn is_valid_geometry(geom: &Geometry<f64>) -> bool {
    match geom {
        Geometry::Point(p) => coord_is_finite(&p.0),
        Geometry::Line(l) => coord_is_finite(&l.start) && coord_is_finite(&l.end),
        Geometry::LineString(ls) => ls.0.len() >= 2 && ls.0.iter().all(coord_is_finite),
        Geometry::Polygon(p) => polygon_is_valid(p),
        Geometry::MultiPoint(mp) => !mp.0.is_empty() && mp.0.iter().all(|p| coord_is_finite(&p.0)),
        Geometry::MultiLineString(mls) => {
            !mls.0.is_empty() && mls.0.iter().all(|ls| ls.0.len() >= 2 && ls.0.iter().all(coord_is_finite))
        }
        Geometry::MultiPolygon(mp) => {
            !mp.0.is_empty() && mp.0.iter().all(polygon_is_valid) && !parts_overlap(mp)
        }
        Geometry::Rect(r) => {
            coord_is_finite(&r.min()) && coord_is_finite(&r.max()) && r.unsigned_area() > 0.0
        }
        Geometry::Triangle(t) => polygon_is_valid(&t.to_polygon()),
        Geometry::GeometryCollection(gc) => !gc.0.is_empty() && gc.0.iter().all(is_valid_geometry),
    }
}

/// Drop non-finite and consecutive duplicate coordinates
fn clean_coords(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords.iter().filter(|c| coord_is_finite(c)) {
        if out.last() != Some(c) {
            out.push(*c);
        }
    }
    out
}

fn repair_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords = clean_coords(&ring.0);
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }
    coords.push(coords[0]);
    let ring = LineString::new(coords);
    let enclosed = Polygon::new(ring.clone(), vec![]).unsigned_area();
    (enclosed > 0.0).then_some(ring)
}

fn repair_polygon(p: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = repair_ring(p.exterior())?;
    let interiors = p.interiors().iter().filter_map(repair_ring).collect();
    Some(Polygon::new(exterior, interiors).orient(Direction::Default))
}

fn dissolve_parts(parts: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    if parts.len() < 2 {
        return MultiPolygon::new(parts);
    }
    parts
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, part| {
            acc.union(&MultiPolygon::new(vec![part]))
        })
}

fn repair_areal(parts: &[Polygon<f64>]) -> Option<Geometry<f64>> {
    let repaired: Vec<Polygon<f64>> = parts.iter().filter_map(repair_polygon).collect();
    let dissolved = dissolve_parts(repaired);
    match dissolved.0.len() {
        0 => None,
        _ => Some(Geometry::MultiPolygon(dissolved.orient(Direction::Default))),
    }
}

/// Repair a geometry, the way `buffer(0)` is used on cadastral layers.
///
/// 1. drop non-finite coordinates
/// 2. remove consecutive duplicate vertices
/// 3. close rings
/// 4. drop rings with fewer than three distinct vertices or zero area
/// 5. orient rings (exterior counter-clockwise, holes clockwise)
/// 6. dissolve overlapping multipolygon parts
///
/// Polygons stay polygons when a single part survives. Returns `None` when
/// nothing valid remains.
pub fn repair_geometry(geom: &Geometry<f64>) -> Option<Geometry<f64>> {
    match geom {
        Geometry::Point(p) => coord_is_finite(&p.0).then_some(Geometry::Point(*p)),
        Geometry::Line(l) => {
            (coord_is_finite(&l.start) && coord_is_finite(&l.end)).then_some(Geometry::Line(*l))
        }
        Geometry::LineString(ls) => {
            let coords = clean_coords(&ls.0);
            (coords.len() >= 2).then(|| Geometry::LineString(LineString::new(coords)))
        }
        Geometry::MultiPoint(mp) => {
            let points: Vec<Point<f64>> =
                mp.0.iter().filter(|p| coord_is_finite(&p.0)).copied().collect();
            (!points.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(points)))
        }
        Geometry::MultiLineString(mls) => {
            let lines: Vec<LineString<f64>> = mls
                .0
                .iter()
                .map(|ls| LineString::new(clean_coords(&ls.0)))
                .filter(|ls| ls.0.len() >= 2)
                .collect();
            (!lines.is_empty()).then(|| Geometry::MultiLineString(MultiLineString::new(lines)))
        }
        Geometry::Polygon(p) => repair_polygon(p).map(Geometry::Polygon),
        Geometry::Rect(r) => repair_polygon(&r.to_polygon()).map(Geometry::Polygon),
        Geometry::Triangle(t) => repair_polygon(&t.to_polygon()).map(Geometry::Polygon),
        Geometry::MultiPolygon(mp) => repair_areal(&mp.0),
        Geometry::GeometryCollection(gc) => {
            let parts: Vec<Geometry<f64>> = gc.0.iter().filter_map(repair_geometry).collect();
            (!parts.is_empty()).then(|| Geometry::GeometryCollection(GeometryCollection::from(parts)))
        }
    }
}
