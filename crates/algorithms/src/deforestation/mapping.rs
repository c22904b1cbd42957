//! Map framing and point rendering of alert layers

use geo::Geometry;
use serde::Serialize;
use ucmonitor_core::{Feature, FeatureCollection, Result, CRS};

use crate::vector::{centroid, total_bounds, BoundingBox};

/// Extent of an alert layer with its center, for framing a map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerBounds {
    pub center_lat: f64,
    pub center_lon: f64,
    pub bbox: BoundingBox,
}

/// Bounds and center of a geographic alert layer; `None` when the layer
/// has no geometry
pub fn alert_bounds(alerts: &FeatureCollection) -> Option<LayerBounds> {
    let bbox = total_bounds(alerts)?;
    let (center_lon, center_lat) = bbox.center();
    Some(LayerBounds {
        center_lat,
        center_lon,
        bbox,
    })
}

/// Replace each alert polygon by its centroid.
///
/// Centroids are taken in `projected_crs` so they are not distorted by
/// degree units, then returned in EPSG:4326 with the original attributes.
/// Alerts without geometry are dropped.
pub fn alert_centroids(alerts: &FeatureCollection, projected_crs: &CRS) -> Result<FeatureCollection> {
    let projected = alerts.to_crs(projected_crs)?;
    let points: Vec<Feature> = projected
        .features
        .into_iter()
        .filter_map(|f| {
            let c = f.geometry.as_ref().and_then(centroid)?;
            Some(Feature {
                geometry: Some(Geometry::Point(c)),
                ..f
            })
        })
        .collect();
    FeatureCollection::with_crs(points, projected_crs.clone()).to_crs(&CRS::wgs84())
}
