//! Column standardization for alert layers from heterogeneous sources

use std::collections::BTreeSet;
use tracing::{debug, warn};
use ucmonitor_core::{AttributeValue, Error, FeatureCollection, Result, CRS};

use crate::places::normalize_state;
use crate::vector::is_valid_geometry;

/// Canonical alert column and the upper-cased source names mapped to it
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("ESTADO", &["ESTADO", "UF", "STATE"]),
    ("MUNICIPIO", &["MUNICIPIO", "CITY"]),
    ("AREAHA", &["AREAHA", "AREA", "ALERTHA"]),
    ("ANODETEC", &["ANODETEC", "ANO", "DETECTYEAR"]),
    ("DATADETEC", &["DATADETEC", "DATA", "DETECTAT"]),
    ("BIOMA", &["BIOMA", "BIOME"]),
    ("CODEALERTA", &["CODEALERTA", "ALERTCODE", "ALERTID"]),
];

/// Columns every standardized alert carries, Null when unknown
const ESSENTIAL_COLUMNS: &[&str] = &["MUNICIPIO", "AREAHA", "ANODETEC", "DATADETEC", "CODEALERTA", "BIOMA"];

/// Canonical alert column for a source column name, compared
/// case-insensitively
fn canonical_column(name: &str) -> Option<&'static str> {
    let upper = name.to_uppercase();
    COLUMN_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&upper.as_str()))
        .map(|(canonical, _)| *canonical)
}

/// Bring an alert layer from any source to the common alert schema.
///
/// Layers without a CRS are taken as SIRGAS 2000. Features with null or
/// invalid geometry are dropped, aliased columns are renamed, `ESTADO`
/// is normalized to the full state name and features without a
/// recognizable state are dropped. Each feature gets `origem = origin`
/// and, unless the layer already has one, `id_alerta = "{origin}_{i}"`.
///
/// # Arguments
/// * `fc` - Alert layer as read from disk
/// * `origin` - Source label, e.g. `"Pará"` or `"TI"`
///
/// # Returns
/// The layer in EPSG:4326, or `MissingAttribute` when no column maps to
/// `ESTADO`. An empty input gives an empty layer.
pub fn standardize_alert_layer(fc: &FeatureCollection, origin: &str) -> Result<FeatureCollection> {
    if fc.is_empty() {
        warn!(origin, "empty alert layer");
        return Ok(FeatureCollection::with_crs(Vec::new(), CRS::wgs84()));
    }

    let mut layer = fc.clone();
    if layer.crs().is_none() {
        layer.set_crs(Some(CRS::sirgas2000()));
    }
    let mut layer = layer.to_crs(&CRS::wgs84())?;

    layer
        .features
        .retain(|f| f.geometry.as_ref().is_some_and(is_valid_geometry));

    let columns: BTreeSet<String> = layer
        .iter()
        .flat_map(|f| f.properties.keys().cloned())
        .collect();
    let renames: Vec<(String, &'static str)> = columns
        .iter()
        .filter_map(|c| canonical_column(c).map(|canonical| (c.clone(), canonical)))
        .filter(|(c, canonical)| c != canonical)
        .collect();

    if !layer.is_empty() && !columns.iter().any(|c| canonical_column(c) == Some("ESTADO")) {
        return Err(Error::MissingAttribute("ESTADO".to_string()));
    }

    for feature in layer.iter_mut() {
        for (from, to) in &renames {
            if let Some(value) = feature.properties.remove(from) {
                // a column already spelled canonically wins over its aliases
                feature.properties.entry(to.to_string()).or_insert(value);
            }
        }
    }

    let before = layer.len();
    layer.features.retain_mut(|f| {
        let state = f.text("ESTADO").and_then(|s| normalize_state(&s));
        match state {
            Some(name) => {
                f.set_property("ESTADO", AttributeValue::from(name));
                true
            }
            None => false,
        }
    });
    let dropped = before - layer.len();
    if dropped > 0 {
        warn!(origin, dropped, "dropped alerts without a recognizable state");
    }

    let assign_ids = !layer.has_column("id_alerta");
    for (i, feature) in layer.iter_mut().enumerate() {
        for column in ESSENTIAL_COLUMNS {
            if !feature.has_property(column) {
                feature.set_property(*column, AttributeValue::Null);
            }
        }
        feature.set_property("origem", AttributeValue::from(origin));
        if assign_ids {
            feature.set_property("id_alerta", AttributeValue::String(format!("{origin}_{i}")));
        }
    }

    debug!(origin, features = layer.len(), "standardized alert layer");
    Ok(layer)
}

/// Concatenate standardized alert layers, skipping empty ones, and number
/// the result `alerta_0`, `alerta_1`, ...
pub fn combine_alert_layers(layers: Vec<FeatureCollection>) -> Result<FeatureCollection> {
    let non_empty: Vec<FeatureCollection> = layers.into_iter().filter(|l| !l.is_empty()).collect();
    if non_empty.is_empty() {
        warn!("no alert layer loaded");
        return Ok(FeatureCollection::with_crs(Vec::new(), CRS::wgs84()));
    }

    let mut combined = FeatureCollection::concat(non_empty)?;
    for (i, feature) in combined.iter_mut().enumerate() {
        feature.set_property("id_alerta", AttributeValue::String(format!("alerta_{i}")));
    }
    Ok(combined)
}
