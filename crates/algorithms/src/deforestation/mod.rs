//! Deforestation alert layers
//!
//! Standardization of alert sources into a common schema, selection by
//! state and detection year, municipality rankings, monthly series and
//! map helpers.

mod mapping;
mod ranking;
mod standardize;

pub use mapping::{alert_bounds, alert_centroids, LayerBounds};
pub use ranking::{monthly_alert_area, municipality_ranking, MunicipalityRanking};
pub use standardize::{combine_alert_layers, standardize_alert_layer};

pub use crate::timeseries::YearFilter;

use std::collections::BTreeSet;
use ucmonitor_core::{Feature, FeatureCollection};

fn detection_year(f: &Feature) -> Option<i32> {
    f.number("ANODETEC").map(|y| y.round() as i32)
}

/// Alerts whose `ESTADO` equals `state`. Layers without the column give
/// an empty layer.
pub fn filter_by_state(alerts: &FeatureCollection, state: &str) -> FeatureCollection {
    if !alerts.has_column("ESTADO") {
        return alerts.filter(|_| false);
    }
    alerts.filter(|f| f.text("ESTADO").as_deref() == Some(state))
}

/// Alerts detected in the selected year. Layers without `ANODETEC` are
/// returned whole.
pub fn filter_by_year(alerts: &FeatureCollection, year: YearFilter) -> FeatureCollection {
    match year {
        YearFilter::All => alerts.clone(),
        YearFilter::Year(_) if !alerts.has_column("ANODETEC") => alerts.clone(),
        YearFilter::Year(_) => alerts.filter(|f| year.matches(detection_year(f))),
    }
}

/// Sorted distinct detection years
pub fn available_years(alerts: &FeatureCollection) -> Vec<i32> {
    alerts
        .iter()
        .filter_map(detection_year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
