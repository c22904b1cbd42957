//! Douglas-Peucker geometry simplification

use geo::Simplify;
use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Polygon};

/// Simplify a geometry using the Douglas-Peucker algorithm.
///
/// Removes vertices that deviate less than `tolerance` from the
/// simplified line. Polygon rings that would collapse below four
/// positions are kept as they were, so areal geometries stay valid.
///
/// # Arguments
/// * `geom` - Input geometry
/// * `tolerance` - Maximum allowed deviation, in CRS units
pub fn simplify_dp(geom: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    if tolerance <= 0.0 {
        return geom.clone();
    }
    match geom {
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify(&tolerance)),
        Geometry::Polygon(p) => Geometry::Polygon(simplify_polygon_dp(p, tolerance)),
        Geometry::MultiLineString(mls) => {
            let simplified: Vec<LineString<f64>> =
                mls.0.iter().map(|ls| ls.simplify(&tolerance)).collect();
            Geometry::MultiLineString(MultiLineString::new(simplified))
        }
        Geometry::MultiPolygon(mp) => {
            let simplified: Vec<Polygon<f64>> = mp
                .0
                .iter()
                .map(|p| simplify_polygon_dp(p, tolerance))
                .collect();
            Geometry::MultiPolygon(MultiPolygon::new(simplified))
        }
        other => other.clone(),
    }
}

fn simplify_ring(ring: &LineString<f64>, tolerance: f64) -> Option<LineString<f64>> {
    let simplified = ring.simplify(&tolerance);
    (simplified.0.len() >= 4).then_some(simplified)
}

fn simplify_polygon_dp(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let exterior = simplify_ring(polygon.exterior(), tolerance)
        .unwrap_or_else(|| polygon.exterior().clone());
    // Holes that collapse are dropped
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .filter_map(|ring| simplify_ring(ring, tolerance))
        .collect();
    Polygon::new(exterior, interiors)
}
