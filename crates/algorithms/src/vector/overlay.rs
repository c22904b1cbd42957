//! Polygon overlay (intersection) between two layers
//!
//! Equivalent to an `overlay(how="intersection")`: every pair of
//! intersecting areal features produces one piece holding their common
//! area. Pieces are returned in (left, right) order regardless of the
//! execution mode.

use geo::{Area, BooleanOps, Geometry, MultiPolygon};
use serde::Serialize;
use tracing::debug;
use ucmonitor_core::{Algorithm, Error, FeatureCollection, Result};

use super::join::{ensure_same_crs, spatial_join, JoinPair};
use crate::maybe_rayon::*;

/// One intersection piece between a left and a right feature
#[derive(Debug, Clone, Serialize)]
pub struct OverlayPiece {
    /// Index of the feature in the left layer
    pub left: usize,
    /// Index of the feature in the right layer
    pub right: usize,
    /// Common area of both features
    #[serde(skip)]
    pub geometry: MultiPolygon<f64>,
    /// Planar area of `geometry`, in CRS units squared
    pub area: f64,
}

/// Parameters for the overlay
#[derive(Debug, Clone)]
pub struct OverlayParams {
    /// Pieces with an area at or below this value are dropped
    pub min_area: f64,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self { min_area: 0.0 }
    }
}

/// Overlay algorithm
#[derive(Debug, Clone, Default)]
pub struct Overlay;

impl Algorithm for Overlay {
    type Input = (FeatureCollection, FeatureCollection);
    type Output = Vec<OverlayPiece>;
    type Params = OverlayParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Overlay"
    }

    fn description(&self) -> &'static str {
        "Intersect two polygon layers and measure the area of every intersecting pair"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (left, right) = input;
        overlay_with(&left, &right, &params)
    }
}

/// Convert an areal geometry to a MultiPolygon, `None` for anything else
fn as_multipolygon(geom: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polys: Vec<_> = gc
                .0
                .iter()
                .filter_map(as_multipolygon)
                .flat_map(|mp| mp.0)
                .collect();
            (!polys.is_empty()).then(|| MultiPolygon::new(polys))
        }
        _ => None,
    }
}

/// Intersect two polygon layers.
///
/// Both layers must share a CRS; areas are in that CRS's units, so
/// project to a metric CRS first. Non-areal features are ignored and
/// pieces with zero area (touching boundaries) are dropped.
///
/// # Arguments
/// * `left` - First polygon layer (e.g. conservation units)
/// * `right` - Second polygon layer (e.g. parcels or alerts)
///
/// # Returns
/// Pieces ordered by left index, then right index
pub fn overlay_intersection(left: &FeatureCollection, right: &FeatureCollection) -> Result<Vec<OverlayPiece>> {
    overlay_with(left, right, &OverlayParams::default())
}

fn overlay_with(left: &FeatureCollection, right: &FeatureCollection, params: &OverlayParams) -> Result<Vec<OverlayPiece>> {
    let pairs = spatial_join(left, right)?;
    intersect_pairs(left, right, &pairs, params)
}

/// Intersect the given pairs of a prior [`spatial_join`] of the same
/// layers.
///
/// Lets callers that also need the join pairs (for example to count
/// touching features) reuse one join instead of building the index twice.
///
/// # Returns
/// Pieces in the order of `pairs`, without those at or below
/// `params.min_area`
pub fn intersect_pairs(
    left: &FeatureCollection,
    right: &FeatureCollection,
    pairs: &[JoinPair],
    params: &OverlayParams,
) -> Result<Vec<OverlayPiece>> {
    if params.min_area < 0.0 || !params.min_area.is_finite() {
        return Err(Error::InvalidParameter {
            name: "min_area",
            value: params.min_area.to_string(),
            reason: "must be a finite value >= 0".to_string(),
        });
    }
    ensure_same_crs(left, right)?;

    let left_polys: Vec<Option<MultiPolygon<f64>>> = left
        .iter()
        .map(|f| f.geometry.as_ref().and_then(as_multipolygon))
        .collect();
    let right_polys: Vec<Option<MultiPolygon<f64>>> = right
        .iter()
        .map(|f| f.geometry.as_ref().and_then(as_multipolygon))
        .collect();

    let pieces: Vec<OverlayPiece> = pairs
        .into_par_iter()
        .filter_map(|&JoinPair { left: i, right: j }| {
            let a = left_polys.get(i)?.as_ref()?;
            let b = right_polys.get(j)?.as_ref()?;
            let geometry = a.intersection(b);
            let area = geometry.unsigned_area();
            (area > params.min_area).then_some(OverlayPiece {
                left: i,
                right: j,
                geometry,
                area,
            })
        })
        .collect();

    debug!(pairs = pairs.len(), pieces = pieces.len(), "overlay intersection");
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::BoundingBox;
    use ucmonitor_core::{Feature, CRS};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Feature {
        Feature::new(Geometry::Polygon(BoundingBox::new(x0, y0, x1, y1).to_polygon()))
    }

    fn layer(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection::with_crs(features, CRS::sirgas2000_utm23s())
    }

    #[test]
    fn half_overlap() {
        let units = layer(vec![rect(0.0, 0.0, 1000.0, 1000.0)]);
        let parcels = layer(vec![rect(500.0, 0.0, 1500.0, 1000.0)]);
        let pieces = overlay_intersection(&units, &parcels).unwrap();
        assert_eq!(pieces.len(), 1);
        assert!((pieces[0].area - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn touching_boundaries_are_dropped() {
        let units = layer(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let parcels = layer(vec![rect(10.0, 0.0, 20.0, 10.0)]);
        assert!(overlay_intersection(&units, &parcels).unwrap().is_empty());
    }

    #[test]
    fn one_piece_per_pair() {
        let units = layer(vec![rect(0.0, 0.0, 10.0, 10.0), rect(10.0, 0.0, 20.0, 10.0)]);
        let parcels = layer(vec![rect(5.0, 0.0, 15.0, 10.0), rect(0.0, 0.0, 2.0, 2.0)]);
        let pieces = overlay_intersection(&units, &parcels).unwrap();
        let keys: Vec<(usize, usize)> = pieces.iter().map(|p| (p.left, p.right)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (1, 0)]);
        assert!((pieces[0].area - 50.0).abs() < 1e-9);
        assert!((pieces[1].area - 4.0).abs() < 1e-9);
        assert!((pieces[2].area - 50.0).abs() < 1e-9);
    }

    #[test]
    fn pairs_from_one_join() {
        let units = layer(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let parcels = layer(vec![rect(5.0, 0.0, 15.0, 10.0), rect(10.0, 0.0, 20.0, 10.0)]);
        let pairs = spatial_join(&units, &parcels).unwrap();
        assert_eq!(pairs.len(), 2);
        let pieces = intersect_pairs(&units, &parcels, &pairs, &OverlayParams::default()).unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].right, 0);
    }

    #[test]
    fn points_are_ignored() {
        let units = layer(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let points = layer(vec![Feature::new(Geometry::Point(geo::Point::new(1.0, 1.0)))]);
        assert!(overlay_intersection(&units, &points).unwrap().is_empty());
    }

    #[test]
    fn algorithm_trait() {
        let algo = Overlay;
        assert_eq!(algo.name(), "Overlay");
        let units = layer(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let parcels = layer(vec![rect(0.0, 0.0, 10.0, 0.5)]);

        let pieces = algo.execute_default((units.clone(), parcels.clone())).unwrap();
        assert_eq!(pieces.len(), 1);

        let filtered = algo
            .execute((units.clone(), parcels.clone()), OverlayParams { min_area: 10.0 })
            .unwrap();
        assert!(filtered.is_empty());

        let err = algo.execute((units, parcels), OverlayParams { min_area: -1.0 });
        assert!(matches!(err, Err(Error::InvalidParameter { .. })));
    }
}
