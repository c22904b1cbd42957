//! Load-time normalization of polygon layers

use tracing::{debug, warn};
use ucmonitor_core::{AttributeValue, FeatureCollection, Result, CRS};

use super::measurements::area_km2;
use super::repair::{is_valid_geometry, repair_geometry};
use super::simplify::simplify_dp;
use crate::coverage::coverage_percentages;

/// Parameters for [`prepare_layer`]
#[derive(Debug, Clone)]
pub struct PrepareParams {
    /// CRS assigned to layers that declare none
    pub default_crs: CRS,
    /// Planar CRS for area computation and simplification
    pub area_crs: CRS,
    /// CRS of the returned layer
    pub output_crs: CRS,
    /// Attributes to keep; `None` keeps everything
    pub columns: Option<Vec<String>>,
    /// Compute `perc_alerta` / `perc_sigef` from the km² columns
    pub compute_percentages: bool,
    /// Douglas-Peucker tolerance in metres, applied in `area_crs`
    pub simplify_tolerance_m: Option<f64>,
}

impl Default for PrepareParams {
    fn default() -> Self {
        Self {
            default_crs: CRS::sirgas2000(),
            area_crs: CRS::sirgas2000_utm23s(),
            output_crs: CRS::wgs84(),
            columns: None,
            compute_percentages: true,
            simplify_tolerance_m: None,
        }
    }
}

/// Normalize a freshly loaded polygon layer.
///
/// 1. assign `default_crs` when the layer has none
/// 2. repair invalid geometries; drop null or irreparable ones
/// 3. keep only `columns` when given
/// 4. compute `area_km2` in `area_crs` when the layer lacks it,
///    simplifying there first when a tolerance is set
/// 5. compute coverage percentages, or default them to 0
/// 6. give every feature an id from its row position when missing
/// 7. reproject to `output_crs`
pub fn prepare_layer(fc: &FeatureCollection, params: &PrepareParams) -> Result<FeatureCollection> {
    let mut layer = fc.clone();
    if layer.crs().is_none() {
        layer.set_crs(Some(params.default_crs.clone()));
    }

    let before = layer.len();
    layer.features.retain_mut(|f| {
        let Some(geom) = f.geometry.as_ref() else {
            return false;
        };
        if is_valid_geometry(geom) {
            return true;
        }
        match repair_geometry(geom) {
            Some(fixed) => {
                f.geometry = Some(fixed);
                true
            }
            None => false,
        }
    });
    let dropped = before - layer.len();
    if dropped > 0 {
        warn!(dropped, "dropped features with null or irreparable geometry");
    }

    let area_computed = !layer.has_column("area_km2");
    if let Some(columns) = &params.columns {
        for feature in layer.iter_mut() {
            feature
                .properties
                .retain(|k, _| columns.iter().any(|c| c == k) || (area_computed && k == "area_km2"));
        }
    }

    let tolerance = params.simplify_tolerance_m.filter(|t| *t > 0.0);
    if area_computed || tolerance.is_some() {
        layer = layer.to_crs(&params.area_crs)?;
        for feature in layer.iter_mut() {
            if let (Some(t), Some(geom)) = (tolerance, feature.geometry.as_ref()) {
                feature.geometry = Some(simplify_dp(geom, t));
            }
            if area_computed {
                let km2 = feature.geometry.as_ref().map_or(0.0, area_km2);
                feature.set_property("area_km2", AttributeValue::Float(km2));
            }
        }
    }

    if params.compute_percentages && layer.has_column("area_km2") {
        coverage_percentages(&mut layer);
    } else {
        for key in ["perc_alerta", "perc_sigef"] {
            if !layer.has_column(key) {
                for feature in layer.iter_mut() {
                    feature.set_property(key, AttributeValue::Float(0.0));
                }
            }
        }
    }

    for (i, feature) in layer.iter_mut().enumerate() {
        if feature.id.is_none() {
            feature.id = Some(i.to_string());
        }
        if !feature.has_property("id") {
            feature.set_property("id", AttributeValue::String(i.to_string()));
        }
    }

    let out = layer.to_crs(&params.output_crs)?;
    debug!(features = out.len(), dropped, crs = %params.output_crs, "prepared layer");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, LineString, MultiPolygon, Polygon};
    use ucmonitor_core::Feature;

    /// ~1.1 km square in geographic degrees near the 45°W meridian
    fn unit_square(x0: f64) -> Polygon<f64> {
        let d = 0.01;
        Polygon::new(
            LineString::from(vec![(x0, -2.0), (x0 + d, -2.0), (x0 + d, -2.0 + d), (x0, -2.0 + d), (x0, -2.0)]),
            vec![],
        )
    }

    #[test]
    fn full_pipeline() {
        let degenerate = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]), vec![]);
        let fc: FeatureCollection = vec![
            Feature::new(Geometry::Polygon(unit_square(-45.0)))
                .with_property("nome_uc", "A")
                .with_property("alerta_km2", 0.6)
                .with_property("extra", 1i64),
            Feature::empty().with_property("nome_uc", "sem geometria"),
            Feature::new(Geometry::Polygon(degenerate)).with_property("nome_uc", "degenerada"),
        ]
        .into_iter()
        .collect();

        let params = PrepareParams {
            columns: Some(vec!["nome_uc".into(), "alerta_km2".into()]),
            ..Default::default()
        };
        let out = prepare_layer(&fc, &params).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out.crs(), Some(&CRS::wgs84()));
        let f = &out.features[0];
        assert!(!f.has_property("extra"));
        let km2 = f.number("area_km2").unwrap();
        assert!(km2 > 1.2 && km2 < 1.3, "area {}", km2);
        let perc = f.number("perc_alerta").unwrap();
        assert!((perc - 0.6 / km2 * 100.0).abs() < 1e-9);
        assert_eq!(f.number("perc_sigef"), Some(0.0));
        assert_eq!(f.id.as_deref(), Some("0"));

        // geographic coordinates come back unchanged
        if let Some(Geometry::Polygon(p)) = &f.geometry {
            let c = p.exterior().0[0];
            assert!((c.x + 45.0).abs() < 1e-7);
            assert!((c.y + 2.0).abs() < 1e-7);
        } else {
            panic!("expected polygon");
        }
    }

    #[test]
    fn existing_area_is_kept() {
        let fc = FeatureCollection::with_crs(
            vec![Feature::new(Geometry::Polygon(unit_square(-45.0))).with_property("area_km2", 99.0)],
            CRS::sirgas2000(),
        );
        let params = PrepareParams {
            compute_percentages: false,
            ..Default::default()
        };
        let out = prepare_layer(&fc, &params).unwrap();
        assert_eq!(out.features[0].number("area_km2"), Some(99.0));
        assert_eq!(out.features[0].number("perc_alerta"), Some(0.0));
    }

    #[test]
    fn simplification_reduces_vertices() {
        let mut coords: Vec<(f64, f64)> = (0..=100).map(|i| (-45.0 + i as f64 * 1e-4, -2.0)).collect();
        coords.extend([(-44.99, -1.99), (-45.0, -1.99), (-45.0, -2.0)]);
        let fc = FeatureCollection::with_crs(
            vec![Feature::new(Geometry::Polygon(Polygon::new(LineString::from(coords), vec![])))],
            CRS::sirgas2000(),
        );
        let params = PrepareParams {
            simplify_tolerance_m: Some(5.0),
            ..Default::default()
        };
        let out = prepare_layer(&fc, &params).unwrap();
        match &out.features[0].geometry {
            Some(Geometry::Polygon(p)) => assert!(p.exterior().0.len() < 20),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn overlapping_parts_counted_once() {
        let square = |x0: f64| {
            Polygon::new(
                LineString::from(vec![
                    (x0, 9_000_000.0),
                    (x0 + 1000.0, 9_000_000.0),
                    (x0 + 1000.0, 9_001_000.0),
                    (x0, 9_001_000.0),
                    (x0, 9_000_000.0),
                ]),
                vec![],
            )
        };
        let doubled = MultiPolygon::new(vec![square(500_000.0), square(500_000.0)]);
        let fc = FeatureCollection::with_crs(
            vec![Feature::new(Geometry::MultiPolygon(doubled))],
            CRS::sirgas2000_utm23s(),
        );
        let params = PrepareParams {
            output_crs: CRS::sirgas2000_utm23s(),
            ..Default::default()
        };
        let out = prepare_layer(&fc, &params).unwrap();
        let km2 = out.features[0].number("area_km2").unwrap();
        assert!((km2 - 1.0).abs() < 1e-6, "area {}", km2);
    }
}
