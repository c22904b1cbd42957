//! Vector analysis algorithms
//!
//! Geometric operations on vector layers:
//! - Area: planar measurements in CRS units
//! - Simplify: Douglas-Peucker vertex reduction
//! - Centroid / bounding box / layer bounds
//! - Repair: `buffer(0)`-style geometry cleanup
//! - Index: R-tree over feature envelopes
//! - Join: intersecting feature pairs between two layers
//! - Overlay: polygon intersection pieces between two layers
//! - Prepare: load-time normalization of a polygon layer

mod index;
mod join;
mod measurements;
mod overlay;
mod prepare;
mod repair;
mod simplify;
mod spatial;

pub use index::LayerIndex;
pub use join::{ensure_same_crs, spatial_join, JoinPair};
pub use measurements::{area, area_ha, area_km2};
pub use overlay::{intersect_pairs, overlay_intersection, Overlay, OverlayParams, OverlayPiece};
pub use prepare::{prepare_layer, PrepareParams};
pub use repair::{is_valid_geometry, repair_geometry};
pub use simplify::simplify_dp;
pub use spatial::{bounding_box, centroid, total_bounds, BoundingBox};
