//! Per-unit overlap tables, alert tallies and occupancy

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use ucmonitor_core::{AttributeValue, Feature, FeatureCollection, Result, CRS};

use crate::vector::{area, intersect_pairs, spatial_join, OverlayParams};

const M2_PER_HA: f64 = 10_000.0;
const UNKNOWN_UNIT: &str = "N/A";

/// One row of the unified per-unit table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOverlapRow {
    pub name: String,
    pub unit_area_ha: f64,
    pub alert_area_ha: f64,
    pub alert_count: usize,
    pub parcel_area_ha: f64,
    pub parcel_count: usize,
}

/// Alert area summed over one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitAlertArea {
    pub name: String,
    pub alert_ha: f64,
}

/// Number of points falling in one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitPointCount {
    pub name: String,
    pub count: usize,
}

/// Stored alert and parcel counts of one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCounts {
    pub name: String,
    pub alert_count: u64,
    pub parcel_count: u64,
    pub total: u64,
}

/// Which units an occupancy figure covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnitSelection {
    #[default]
    All,
    Named(String),
}

/// Parcel occupancy of a unit (or of all units)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occupancy {
    pub unit_area_ha: f64,
    pub parcel_area_ha: f64,
    /// Parcel area as a percentage of the unit area; may exceed 100
    pub percent: f64,
    /// Unit area not covered by parcels, never negative
    pub free_area_ha: f64,
}

/// Per-unit overlap area and number of intersecting features
#[derive(Debug, Clone, Copy, Default)]
struct Overlap {
    area_ha: f64,
    count: usize,
}

fn unit_name(unit: &Feature) -> String {
    unit.text("nome_uc").unwrap_or_else(|| UNKNOWN_UNIT.to_string())
}

fn stored_count(feature: &Feature, key: &str) -> u64 {
    feature.number(key).map_or(0, |v| v.max(0.0) as u64)
}

/// Intersect projected units with another projected layer and
/// aggregate per unit
fn overlaps_by_unit(units: &FeatureCollection, other: &FeatureCollection) -> Result<Vec<Overlap>> {
    let mut out = vec![Overlap::default(); units.len()];
    if other.is_empty() {
        return Ok(out);
    }
    let pairs = spatial_join(units, other)?;
    for pair in &pairs {
        out[pair.left].count += 1;
    }
    for piece in intersect_pairs(units, other, &pairs, &OverlayParams::default())? {
        out[piece.left].area_ha += piece.area / M2_PER_HA;
    }
    Ok(out)
}

fn project_if_any(fc: &FeatureCollection, crs: &CRS) -> Result<FeatureCollection> {
    if fc.is_empty() {
        Ok(FeatureCollection::with_crs(Vec::new(), crs.clone()))
    } else {
        fc.to_crs(crs)
    }
}

/// Build the unified per-unit overlap table.
///
/// For every unit: its stored area (`area_ha`, else `ha_total`, else the
/// computed area), the area and number of intersecting alerts, and the
/// area and number of intersecting parcels. Units without geometry
/// report their stored `alerta_ha`, `c_alertas`, `sigef_ha` and
/// `c_sigef` values instead.
///
/// # Returns
/// Rows sorted by unit area, largest first
pub fn unit_overlap_table(
    units: &FeatureCollection,
    alerts: &FeatureCollection,
    parcels: &FeatureCollection,
    projected_crs: &CRS,
) -> Result<Vec<UnitOverlapRow>> {
    if units.is_empty() {
        return Ok(Vec::new());
    }
    let units_proj = units.to_crs(projected_crs)?;
    let alert_overlaps = overlaps_by_unit(&units_proj, &project_if_any(alerts, projected_crs)?)?;
    let parcel_overlaps = overlaps_by_unit(&units_proj, &project_if_any(parcels, projected_crs)?)?;

    let mut rows: Vec<UnitOverlapRow> = units_proj
        .iter()
        .enumerate()
        .map(|(i, unit)| {
            let unit_area_ha = unit
                .number("area_ha")
                .or_else(|| unit.number("ha_total"))
                .or_else(|| unit.geometry.as_ref().map(|g| area(g) / M2_PER_HA))
                .unwrap_or(0.0);

            let (alert, parcel) = if unit.geometry.is_some() {
                (alert_overlaps[i], parcel_overlaps[i])
            } else {
                (
                    Overlap {
                        area_ha: unit.number("alerta_ha").unwrap_or(0.0),
                        count: stored_count(unit, "c_alertas") as usize,
                    },
                    Overlap {
                        area_ha: unit.number("sigef_ha").unwrap_or(0.0),
                        count: stored_count(unit, "c_sigef") as usize,
                    },
                )
            };

            UnitOverlapRow {
                name: unit_name(unit),
                unit_area_ha,
                alert_area_ha: alert.area_ha,
                alert_count: alert.count,
                parcel_area_ha: parcel.area_ha,
                parcel_count: parcel.count,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.unit_area_ha.total_cmp(&a.unit_area_ha));
    Ok(rows)
}

/// Join alerts to units and aggregate per unit name.
///
/// Returns (summed `AREAHA`, matched alert count) keyed by name. Units
/// without a name are skipped.
fn alerts_by_unit_name(
    units: &FeatureCollection,
    alerts: &FeatureCollection,
    projected_crs: &CRS,
) -> Result<BTreeMap<String, (f64, usize)>> {
    let units_proj = units.to_crs(projected_crs)?;
    let alerts_proj = alerts.to_crs(projected_crs)?;

    let mut stats: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for pair in spatial_join(&units_proj, &alerts_proj)? {
        let Some(name) = units_proj.features[pair.left].text("nome_uc") else {
            continue;
        };
        let entry = stats.entry(name).or_default();
        entry.0 += alerts_proj.features[pair.right].number("AREAHA").unwrap_or(0.0);
        entry.1 += 1;
    }
    debug!(units = stats.len(), "alerts joined to units");
    Ok(stats)
}

/// Sum alert `AREAHA` over the alerts intersecting each unit.
///
/// # Returns
/// One row per unit name with at least one alert, largest area first
pub fn alert_area_per_unit(
    units: &FeatureCollection,
    alerts: &FeatureCollection,
    projected_crs: &CRS,
) -> Result<Vec<UnitAlertArea>> {
    if units.is_empty() || alerts.is_empty() {
        return Ok(Vec::new());
    }
    let mut rows: Vec<UnitAlertArea> = alerts_by_unit_name(units, alerts, projected_crs)?
        .into_iter()
        .map(|(name, (alert_ha, _))| UnitAlertArea { name, alert_ha })
        .collect();
    rows.sort_by(|a, b| b.alert_ha.total_cmp(&a.alert_ha));
    Ok(rows)
}

/// Recompute `alerta_ha` and `c_alertas` on every unit from a (filtered)
/// alert layer.
///
/// Units are matched by name; units with no intersecting alert get 0.
/// Empty inputs return the units unchanged.
pub fn refresh_unit_alerts(
    units: &FeatureCollection,
    alerts: &FeatureCollection,
    projected_crs: &CRS,
) -> Result<FeatureCollection> {
    if units.is_empty() || alerts.is_empty() {
        return Ok(units.clone());
    }
    let stats = alerts_by_unit_name(units, alerts, projected_crs)?;

    let mut out = units.clone();
    for unit in out.iter_mut() {
        let (alert_ha, count) = unit
            .text("nome_uc")
            .and_then(|name| stats.get(&name).copied())
            .unwrap_or((0.0, 0));
        unit.set_property("alerta_ha", AttributeValue::Float(alert_ha));
        unit.set_property("c_alertas", AttributeValue::Int(count as i64));
    }
    Ok(out)
}

/// Count the points (e.g. fire hotspots) falling in each unit.
///
/// # Returns
/// At most `top_n` rows, most points first, ties by name
pub fn count_points_per_unit(
    units: &FeatureCollection,
    points: &FeatureCollection,
    projected_crs: &CRS,
    top_n: usize,
) -> Result<Vec<UnitPointCount>> {
    if units.is_empty() || points.is_empty() {
        return Ok(Vec::new());
    }
    let units_proj = units.to_crs(projected_crs)?;
    let points_proj = points.to_crs(projected_crs)?;

    let mut counts: HashMap<String, usize> = HashMap::new();
    for pair in spatial_join(&units_proj, &points_proj)? {
        if let Some(name) = units_proj.features[pair.left].text("nome_uc") {
            *counts.entry(name).or_default() += 1;
        }
    }

    let mut rows: Vec<UnitPointCount> = counts
        .into_iter()
        .map(|(name, count)| UnitPointCount { name, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    rows.truncate(top_n);
    Ok(rows)
}

/// Stored alert and parcel counts per unit, largest total first
pub fn unit_counts(units: &FeatureCollection) -> Vec<UnitCounts> {
    let mut rows: Vec<UnitCounts> = units
        .iter()
        .map(|unit| {
            let alert_count = stored_count(unit, "c_alertas");
            let parcel_count = stored_count(unit, "c_sigef");
            UnitCounts {
                name: unit_name(unit),
                alert_count,
                parcel_count,
                total: alert_count + parcel_count,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    rows
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Parcel occupancy from a hectare-prepared unit layer (`area_ha`,
/// `sigef_ha`).
///
/// Returns `None` when the layer is empty or the named unit is absent.
pub fn parcel_occupancy(units_ha: &FeatureCollection, selection: &UnitSelection) -> Option<Occupancy> {
    if units_ha.is_empty() {
        return None;
    }
    let (unit_area_ha, parcel_area_ha) = match selection {
        UnitSelection::All => (units_ha.sum_property("area_ha"), units_ha.sum_property("sigef_ha")),
        UnitSelection::Named(name) => {
            let unit = units_ha
                .iter()
                .find(|u| u.text("nome_uc").as_deref() == Some(name.as_str()))?;
            (finite_or_zero(unit.number("area_ha")), finite_or_zero(unit.number("sigef_ha")))
        }
    };

    let percent = if unit_area_ha > 0.0 {
        parcel_area_ha / unit_area_ha * 100.0
    } else {
        0.0
    };
    Some(Occupancy {
        unit_area_ha,
        parcel_area_ha,
        percent,
        free_area_ha: (unit_area_ha - parcel_area_ha).max(0.0),
    })
}
