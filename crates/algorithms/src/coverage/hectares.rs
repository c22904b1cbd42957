//! Hectare columns and coverage percentages on a unit layer

use ucmonitor_core::{AttributeValue, FeatureCollection};

const HA_PER_KM2: f64 = 100.0;

/// Derive hectare columns from the km² columns of a unit layer.
///
/// Sets `alerta_ha`, `sigef_ha` and `area_ha` to the matching `*_km2`
/// value times 100 (0 when missing). When `area_ha` ends up 0 it falls
/// back to `ha_total`, then to `num_area`. `ha_total` is filled from
/// `area_km2` when the layer has no such column.
pub fn prepare_hectares(fc: &FeatureCollection) -> FeatureCollection {
    let fill_ha_total = !fc.has_column("ha_total") && fc.has_column("area_km2");
    let mut out = fc.clone();

    for feature in out.iter_mut() {
        let km2 = |key: &str| feature.number(key).unwrap_or(0.0);
        let alerta_ha = km2("alerta_km2") * HA_PER_KM2;
        let sigef_ha = km2("sigef_km2") * HA_PER_KM2;
        let mut area_ha = km2("area_km2") * HA_PER_KM2;

        for fallback in ["ha_total", "num_area"] {
            if area_ha == 0.0 && feature.has_property(fallback) {
                area_ha = feature.number(fallback).unwrap_or(0.0);
            }
        }

        if fill_ha_total {
            let ha_total = feature
                .number("area_km2")
                .map_or(AttributeValue::Null, |v| AttributeValue::Float(v * HA_PER_KM2));
            feature.set_property("ha_total", ha_total);
        }

        feature.set_property("alerta_ha", AttributeValue::Float(alerta_ha));
        feature.set_property("sigef_ha", AttributeValue::Float(sigef_ha));
        feature.set_property("area_ha", AttributeValue::Float(area_ha));
    }
    out
}

fn percent_of(part: Option<f64>, whole: Option<f64>) -> f64 {
    let value = part.unwrap_or(0.0) / whole.unwrap_or(f64::NAN) * 100.0;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Set `perc_alerta` and `perc_sigef` as a share of `area_km2`.
///
/// Division by a zero or missing area yields 0.
pub fn coverage_percentages(fc: &mut FeatureCollection) {
    for feature in fc.iter_mut() {
        let area = feature.number("area_km2");
        let perc_alerta = percent_of(feature.number("alerta_km2"), area);
        let perc_sigef = percent_of(feature.number("sigef_km2"), area);
        feature.set_property("perc_alerta", AttributeValue::Float(perc_alerta));
        feature.set_property("perc_sigef", AttributeValue::Float(perc_sigef));
    }
}
