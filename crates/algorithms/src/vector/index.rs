//! R-tree over feature envelopes for candidate lookups

use rstar::{RTree, RTreeObject, AABB};
use ucmonitor_core::FeatureCollection;

use super::spatial::{bounding_box, BoundingBox};

/// Envelope of one feature, keyed by its position in the layer
#[derive(Debug, Clone)]
struct FeatureEnvelope {
    index: usize,
    bbox: BoundingBox,
}

impl RTreeObject for FeatureEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min_x, self.bbox.min_y],
            [self.bbox.max_x, self.bbox.max_y],
        )
    }
}

/// Spatial index of a layer.
///
/// Features without geometry are not indexed.
#[derive(Debug)]
pub struct LayerIndex {
    tree: RTree<FeatureEnvelope>,
}

impl LayerIndex {
    /// Bulk-load the envelopes of every feature in `fc`
    pub fn build(fc: &FeatureCollection) -> Self {
        let envelopes: Vec<FeatureEnvelope> = fc
            .iter()
            .enumerate()
            .filter_map(|(index, f)| {
                let bbox = bounding_box(f.geometry.as_ref()?)?;
                Some(FeatureEnvelope { index, bbox })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Indices of features whose envelope intersects `bbox`, ascending
    pub fn candidates(&self, bbox: &BoundingBox) -> Vec<usize> {
        let search = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .map(|e| e.index)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Number of indexed features
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
