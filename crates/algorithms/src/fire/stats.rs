//! Monthly risk series, top-municipality charts and summary figures

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{FireFilter, FireRecord};
use crate::timeseries::{contiguous_months, MonthlyValue, YearMonth};

fn plausible_risk(r: &FireRecord) -> Option<f64> {
    r.fire_risk.filter(|v| (0.0..=1.0).contains(v))
}

/// Monthly mean of risk values in [0, 1].
///
/// Contiguous from the first to the last month with data; months without
/// records are 0.
pub fn monthly_mean_risk(records: &[FireRecord]) -> Vec<MonthlyValue> {
    let mut sums: BTreeMap<YearMonth, (f64, usize)> = BTreeMap::new();
    for r in records {
        if let (Some(t), Some(risk)) = (r.timestamp, plausible_risk(r)) {
            let e = sums.entry(YearMonth::of(&t)).or_default();
            e.0 += risk;
            e.1 += 1;
        }
    }
    let means: BTreeMap<YearMonth, f64> = sums
        .into_iter()
        .map(|(month, (sum, n))| (month, sum / n as f64))
        .collect();
    contiguous_months(&means)
}

/// Per-municipality mean used by the bar charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FireMetric {
    /// Mean risk over values in [0, 1]
    MeanRisk,
    /// Mean precipitation over non-negative values
    MeanPrecipitation,
}

impl FireMetric {
    fn value(self, r: &FireRecord) -> Option<f64> {
        match self {
            FireMetric::MeanRisk => plausible_risk(r),
            FireMetric::MeanPrecipitation => r.precipitation.filter(|p| *p >= 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityValue {
    pub municipality: String,
    pub value: f64,
}

/// The `n` municipalities with the highest mean of `metric`, highest
/// first; ties are ordered by name.
pub fn top_municipalities(records: &[FireRecord], metric: FireMetric, n: usize) -> Vec<MunicipalityValue> {
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for r in records {
        if let (Some(m), Some(v)) = (r.municipality_name(), metric.value(r)) {
            let e = sums.entry(m).or_default();
            e.0 += v;
            e.1 += 1;
        }
    }

    let mut values: Vec<MunicipalityValue> = sums
        .into_iter()
        .map(|(m, (sum, count))| MunicipalityValue {
            municipality: m.to_string(),
            value: sum / count as f64,
        })
        .collect();
    values.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.municipality.cmp(&b.municipality)));
    values.truncate(n);
    values
}

/// Headline figures over plausible records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FireSummary {
    pub total_records: usize,
    pub municipality_count: usize,
    /// 0 when there are no records
    pub mean_risk: f64,
    /// 0 when there are no records
    pub mean_precipitation: f64,
    pub first_seen: Option<NaiveDateTime>,
    pub last_seen: Option<NaiveDateTime>,
}

/// Summarize the records accepted by `filter`
pub fn fire_summary(records: &[FireRecord], filter: &FireFilter) -> FireSummary {
    let accepted: Vec<&FireRecord> = records.iter().filter(|r| filter.accepts(r)).collect();
    if accepted.is_empty() {
        return FireSummary::default();
    }

    let n = accepted.len() as f64;
    let municipalities: BTreeSet<&str> = accepted.iter().filter_map(|r| r.municipality_name()).collect();
    FireSummary {
        total_records: accepted.len(),
        municipality_count: municipalities.len(),
        mean_risk: accepted.iter().filter_map(|r| r.fire_risk).sum::<f64>() / n,
        mean_precipitation: accepted.iter().filter_map(|r| r.precipitation).sum::<f64>() / n,
        first_seen: accepted.iter().filter_map(|r| r.timestamp).min(),
        last_seen: accepted.iter().filter_map(|r| r.timestamp).max(),
    }
}
