//! Geometric measurements: planar area

use geo::{Area as GeoArea, Geometry};

const M2_PER_KM2: f64 = 1_000_000.0;
const M2_PER_HA: f64 = 10_000.0;

/// Calculate the area of a geometry.
///
/// Returns unsigned area. For geographic CRS, results are in CRS units squared
/// (e.g., square degrees; project to a metric CRS for square meters).
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        Geometry::Triangle(t) => t.unsigned_area(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(area).sum(),
        _ => 0.0,
    }
}

/// Area in km², for a geometry in a metric CRS
pub fn area_km2(geom: &Geometry<f64>) -> f64 {
    area(geom) / M2_PER_KM2
}

/// Area in hectares, for a geometry in a metric CRS
pub fn area_ha(geom: &Geometry<f64>) -> f64 {
    area(geom) / M2_PER_HA
}
