//! Coverage of conservation units by alerts and land parcels
//!
//! - Summary: headline percentages and counts for a selection of units
//! - Units: per-unit overlap tables, alert tallies, point counts, occupancy
//! - Hectares: hectare columns and coverage percentages on the unit layer

pub mod hectares;
mod summary;
mod units;

pub use hectares::{coverage_percentages, prepare_hectares};
pub use summary::{coverage_summary, CoverageSummary, CoverageSummaryAlgorithm, ParcelFilter, SummaryParams};
pub use units::{
    alert_area_per_unit, count_points_per_unit, parcel_occupancy, refresh_unit_alerts, unit_counts,
    unit_overlap_table, Occupancy, UnitAlertArea, UnitCounts, UnitOverlapRow, UnitPointCount,
    UnitSelection,
};
