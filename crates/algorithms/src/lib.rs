//! # ucmonitor Algorithms
//!
//! Overlap and ranking analyses for conservation-unit monitoring.
//!
//! ## Available Algorithm Categories
//!
//! - **vector**: Area, simplify, repair, spatial join, polygon overlay, layer preparation
//! - **coverage**: Alert and parcel coverage of conservation units
//! - **deforestation**: Alert standardization, municipality ranking, monthly area
//! - **fire**: INPE fire-risk filtering, chunked rankings, monthly risk
//! - **conflicts**: CPT conflict tallies and family splits
//! - **justice**: TJ-PA lawsuit tallies
//! - **places** / **format**: State and municipality names, Brazilian number formatting

pub mod config;
pub mod conflicts;
pub mod coverage;
pub mod deforestation;
pub mod fire;
pub mod format;
pub mod justice;
pub mod places;
pub mod timeseries;
pub mod vector;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::conflicts::{families_per_municipality, summarize_conflicts, ConflictKind, ConflictReport};
    pub use crate::coverage::{
        coverage_summary, parcel_occupancy, prepare_hectares, unit_overlap_table, CoverageSummary,
        CoverageSummaryAlgorithm, ParcelFilter, SummaryParams, UnitSelection,
    };
    pub use crate::deforestation::{
        combine_alert_layers, monthly_alert_area, municipality_ranking, standardize_alert_layer, YearFilter,
    };
    pub use crate::fire::{rank_municipalities, FireFilter, FireRanking, FireRecord, RankingParams, RankingTheme};
    pub use crate::justice::{case_overview, top_counts};
    pub use crate::timeseries::{MonthlyValue, YearMonth};
    pub use crate::vector::{
        overlay_intersection, prepare_layer, spatial_join, Overlay, OverlayParams, PrepareParams,
    };
    pub use ucmonitor_core::prelude::*;
}
