//! Headline coverage figures for a selection of conservation units

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;
use ucmonitor_core::{Algorithm, Error, Feature, FeatureCollection, Result, CRS};

use crate::format::round_to;
use crate::places::split_municipalities;
use crate::vector::{area, intersect_pairs, spatial_join, OverlayParams};

const M2_PER_KM2: f64 = 1_000_000.0;

/// Which parcels take part in the overlay
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParcelFilter {
    /// Every parcel
    #[default]
    All,
    /// Parcels whose `invadindo` attribute matches, trimmed and
    /// case-insensitive
    Category(String),
}

impl ParcelFilter {
    /// Build a filter from a user selection. `None`, blank and `"todos"`
    /// select every parcel.
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            None | Some("") => ParcelFilter::All,
            Some(s) if s.eq_ignore_ascii_case("todos") => ParcelFilter::All,
            Some(s) => ParcelFilter::Category(s.to_string()),
        }
    }

    pub fn matches(&self, parcel: &Feature) -> bool {
        match self {
            ParcelFilter::All => true,
            ParcelFilter::Category(wanted) => parcel
                .text("invadindo")
                .is_some_and(|v| v.to_lowercase() == wanted.trim().to_lowercase()),
        }
    }
}

/// Parameters for [`coverage_summary`]
#[derive(Debug, Clone)]
pub struct SummaryParams {
    /// Planar CRS used for areas
    pub projected_crs: CRS,
    pub parcel_filter: ParcelFilter,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            projected_crs: CRS::sirgas2000_utm23s(),
            parcel_filter: ParcelFilter::All,
        }
    }
}

/// Headline figures for a selection of units
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageSummary {
    /// Alert area as a percentage of the unit area, one decimal
    pub alert_percent: f64,
    /// Parcel overlap area as a percentage of the unit area, one decimal
    pub parcel_percent: f64,
    /// Distinct municipalities touched by the units
    pub municipality_count: usize,
    /// Sum of the units' `c_alertas`
    pub alert_count: u64,
    /// Number of intersecting unit/parcel pairs, parcels that only touch
    /// a unit's boundary included
    pub parcel_overlap_count: usize,
    pub unit_km2: f64,
    pub alert_km2: f64,
    pub parcel_km2: f64,
}

/// Coverage summary algorithm
#[derive(Debug, Clone, Default)]
pub struct CoverageSummaryAlgorithm;

impl Algorithm for CoverageSummaryAlgorithm {
    type Input = (FeatureCollection, FeatureCollection);
    type Output = CoverageSummary;
    type Params = SummaryParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CoverageSummary"
    }

    fn description(&self) -> &'static str {
        "Share of conservation-unit area covered by deforestation alerts and land parcels"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (units, parcels) = input;
        coverage_summary(&units, &parcels, &params)
    }
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round_to(part / whole * 100.0, 1)
    } else {
        0.0
    }
}

/// Count distinct title-cased municipality names in the `municipio` column
fn count_municipalities(units: &FeatureCollection) -> usize {
    units
        .iter()
        .filter_map(|f| f.text("municipio"))
        .flat_map(|m| split_municipalities(&m))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Compute the headline coverage figures.
///
/// Units and the filtered parcels are projected to
/// `params.projected_crs` and intersected; the parcel area is the sum of
/// the intersection pieces. The overlap count covers every intersecting
/// pair, so parcels touching a unit count even though they add no area. Alert figures come from the units' own
/// `alerta_km2` and `c_alertas` attributes.
///
/// # Arguments
/// * `units` - Selected conservation units
/// * `parcels` - Parcel layer, filtered by `params.parcel_filter`
///
/// # Returns
/// All-zero summary when `units` is empty
pub fn coverage_summary(
    units: &FeatureCollection,
    parcels: &FeatureCollection,
    params: &SummaryParams,
) -> Result<CoverageSummary> {
    if units.is_empty() {
        return Ok(CoverageSummary::default());
    }

    let units_proj = units.to_crs(&params.projected_crs)?;
    let selected = parcels.filter(|p| params.parcel_filter.matches(p));

    let (parcel_km2, parcel_overlap_count) = if selected.is_empty() {
        (0.0, 0)
    } else {
        let parcels_proj = selected.to_crs(&params.projected_crs)?;
        let pairs = spatial_join(&units_proj, &parcels_proj)?;
        let pieces = intersect_pairs(&units_proj, &parcels_proj, &pairs, &OverlayParams::default())?;
        let total: f64 = pieces.iter().map(|p| p.area).sum();
        (total / M2_PER_KM2, pairs.len())
    };

    let unit_km2 = units_proj
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(area)
        .sum::<f64>()
        / M2_PER_KM2;
    let alert_km2 = units.sum_property("alerta_km2");
    let alert_count = units.sum_property("c_alertas").max(0.0) as u64;

    let summary = CoverageSummary {
        alert_percent: percent(alert_km2, unit_km2),
        parcel_percent: percent(parcel_km2, unit_km2),
        municipality_count: count_municipalities(units),
        alert_count,
        parcel_overlap_count,
        unit_km2,
        alert_km2,
        parcel_km2,
    };
    debug!(?summary, "coverage summary");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::BoundingBox;
    use geo::Geometry;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Feature {
        Feature::new(Geometry::Polygon(BoundingBox::new(x0, y0, x1, y1).to_polygon()))
    }

    fn planar(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection::with_crs(features, CRS::sirgas2000_utm23s())
    }

    #[test]
    fn filter_selection() {
        assert_eq!(ParcelFilter::from_selection(None), ParcelFilter::All);
        assert_eq!(ParcelFilter::from_selection(Some(" Todos ")), ParcelFilter::All);
        let f = ParcelFilter::from_selection(Some("CAR"));
        assert!(f.matches(&Feature::empty().with_property("invadindo", "  car ")));
        assert!(!f.matches(&Feature::empty().with_property("invadindo", "SIGEF")));
        assert!(!f.matches(&Feature::empty()));
    }

    #[test]
    fn empty_units_give_zeros() {
        let s = coverage_summary(&FeatureCollection::new(), &FeatureCollection::new(), &SummaryParams::default())
            .unwrap();
        assert_eq!(s, CoverageSummary::default());
    }

    #[test]
    fn quarter_overlap() {
        // 2 km x 2 km unit, 1 km x 1 km parcel fully inside
        let units = planar(vec![rect(500_000.0, 9_000_000.0, 502_000.0, 9_002_000.0)
            .with_property("alerta_km2", 0.4)
            .with_property("c_alertas", 3i64)
            .with_property("municipio", "Altamira; São Félix do Xingu")]);
        let parcels = planar(vec![
            rect(500_000.0, 9_000_000.0, 501_000.0, 9_001_000.0).with_property("invadindo", "CAR"),
            rect(600_000.0, 9_000_000.0, 601_000.0, 9_001_000.0).with_property("invadindo", "CAR"),
        ]);
        let s = coverage_summary(&units, &parcels, &SummaryParams::default()).unwrap();
        assert!((s.unit_km2 - 4.0).abs() < 1e-9);
        assert!((s.parcel_km2 - 1.0).abs() < 1e-9);
        assert_eq!(s.parcel_percent, 25.0);
        assert_eq!(s.alert_percent, 10.0);
        assert_eq!(s.parcel_overlap_count, 1);
        assert_eq!(s.alert_count, 3);
        assert_eq!(s.municipality_count, 2);
    }

    #[test]
    fn touching_parcels_count_without_area() {
        let units = planar(vec![rect(500_000.0, 9_000_000.0, 501_000.0, 9_001_000.0)]);
        let parcels = planar(vec![
            rect(500_500.0, 9_000_000.0, 501_500.0, 9_001_000.0),
            rect(501_000.0, 9_000_000.0, 502_000.0, 9_001_000.0),
        ]);
        let s = coverage_summary(&units, &parcels, &SummaryParams::default()).unwrap();
        assert_eq!(s.parcel_overlap_count, 2);
        assert!((s.parcel_km2 - 0.5).abs() < 1e-9);
        assert_eq!(s.parcel_percent, 50.0);
    }

    #[test]
    fn category_excludes_other_parcels() {
        let units = planar(vec![rect(0.0, 0.0, 1000.0, 1000.0)]);
        let parcels = planar(vec![rect(0.0, 0.0, 500.0, 1000.0).with_property("invadindo", "SIGEF")]);
        let params = SummaryParams {
            parcel_filter: ParcelFilter::Category("CAR".into()),
            ..Default::default()
        };
        let s = coverage_summary(&units, &parcels, &params).unwrap();
        assert_eq!(s.parcel_overlap_count, 0);
        assert_eq!(s.parcel_percent, 0.0);
    }

    #[test]
    fn units_without_crs_fail() {
        let units: FeatureCollection = vec![rect(0.0, 0.0, 1.0, 1.0)].into_iter().collect();
        let err = coverage_summary(&units, &FeatureCollection::new(), &SummaryParams::default());
        assert!(matches!(err, Err(Error::MissingCrs)));
    }

    #[test]
    fn algorithm_trait() {
        let algo = CoverageSummaryAlgorithm;
        assert_eq!(algo.name(), "CoverageSummary");
        let units = planar(vec![rect(0.0, 0.0, 1000.0, 1000.0)]);
        let parcels = planar(vec![rect(0.0, 0.0, 500.0, 1000.0)]);
        let s = algo.execute_default((units, parcels)).unwrap();
        assert_eq!(s.parcel_percent, 50.0);
    }
}
