//! Spatial join with the "intersects" predicate

use geo::Intersects;
use serde::Serialize;
use tracing::debug;
use ucmonitor_core::{Error, FeatureCollection, Result};

use super::index::LayerIndex;
use super::spatial::bounding_box;
use crate::maybe_rayon::*;

/// A pair of intersecting features, by position in their layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinPair {
    pub left: usize,
    pub right: usize,
}

/// Fail with `CrsMismatch` unless both layers share a CRS.
///
/// Two layers without CRS are accepted as sharing the same planar frame.
pub fn ensure_same_crs(left: &FeatureCollection, right: &FeatureCollection) -> Result<()> {
    match (left.crs(), right.crs()) {
        (Some(a), Some(b)) if a.is_equivalent(b) => Ok(()),
        (None, None) => Ok(()),
        (a, b) => Err(Error::CrsMismatch(
            a.map_or_else(|| "unset".to_string(), |c| c.identifier()),
            b.map_or_else(|| "unset".to_string(), |c| c.identifier()),
        )),
    }
}

/// Find every pair of intersecting features between two layers.
///
/// Candidates come from an R-tree over `right`, then the exact
/// intersects test is applied. Features without geometry never match.
///
/// # Returns
/// Pairs ordered by left index, then right index
pub fn spatial_join(left: &FeatureCollection, right: &FeatureCollection) -> Result<Vec<JoinPair>> {
    ensure_same_crs(left, right)?;
    if left.is_empty() || right.is_empty() {
        return Ok(Vec::new());
    }

    let index = LayerIndex::build(right);
    let pairs: Vec<JoinPair> = (0..left.len())
        .into_par_iter()
        .flat_map(|i| {
            let Some(geom) = left.features[i].geometry.as_ref() else {
                return Vec::new();
            };
            let Some(bbox) = bounding_box(geom) else {
                return Vec::new();
            };
            index
                .candidates(&bbox)
                .into_iter()
                .filter(|&j| {
                    right.features[j]
                        .geometry
                        .as_ref()
                        .is_some_and(|other| geom.intersects(other))
                })
                .map(|j| JoinPair { left: i, right: j })
                .collect::<Vec<_>>()
        })
        .collect();

    debug!(
        left = left.len(),
        right = right.len(),
        pairs = pairs.len(),
        "spatial join"
    );
    Ok(pairs)
}
