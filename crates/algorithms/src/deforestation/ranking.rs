//! Per-municipality alert aggregation and monthly alert area

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use ucmonitor_core::{Feature, FeatureCollection};

use crate::format::round_to;
use crate::timeseries::{contiguous_months, parse_datetime, MonthlyValue, YearMonth};

const RANKING_COLUMNS: &[&str] = &["ESTADO", "MUNICIPIO", "AREAHA", "ANODETEC", "BIOMA", "VPRESSAO"];

/// One row of the municipality deforestation ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityRanking {
    /// 1-based rank by total area
    pub position: usize,
    pub state: String,
    pub municipality: String,
    pub total_area_ha: f64,
    /// Alerts with a numeric `AREAHA`
    pub alert_count: usize,
    pub mean_area_ha: f64,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    /// Most frequent `BIOMA`, `"N/A"` when none
    pub main_biome: String,
    /// Most frequent `VPRESSAO`, `"N/A"` when none
    pub pressure_vector: String,
}

#[derive(Default)]
struct Group {
    area_sum: f64,
    area_count: usize,
    first_year: Option<i32>,
    last_year: Option<i32>,
    biomes: HashMap<String, usize>,
    vectors: HashMap<String, usize>,
}

impl Group {
    fn add(&mut self, f: &Feature) {
        if let Some(area) = f.number("AREAHA") {
            self.area_sum += area;
            self.area_count += 1;
        }
        if let Some(year) = f.number("ANODETEC").map(|y| y.round() as i32) {
            self.first_year = Some(self.first_year.map_or(year, |y| y.min(year)));
            self.last_year = Some(self.last_year.map_or(year, |y| y.max(year)));
        }
        if let Some(b) = f.text("BIOMA") {
            *self.biomes.entry(b).or_default() += 1;
        }
        if let Some(v) = f.text("VPRESSAO") {
            *self.vectors.entry(v).or_default() += 1;
        }
    }
}

/// Most frequent value; ties go to the lexicographically smallest
fn mode(counts: &HashMap<String, usize>) -> String {
    counts
        .iter()
        .max_by(|(a, ca), (b, cb)| ca.cmp(cb).then_with(|| b.cmp(a)))
        .map(|(v, _)| v.clone())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Rank municipalities by total alert area.
///
/// Alerts are grouped by (`ESTADO`, `MUNICIPIO`); alerts missing either
/// are ignored. Areas are rounded to 2 decimals. Equal totals keep the
/// state/municipality order.
///
/// # Returns
/// Empty when any of `ESTADO`, `MUNICIPIO`, `AREAHA`, `ANODETEC`, `BIOMA`
/// or `VPRESSAO` is absent from the layer
pub fn municipality_ranking(alerts: &FeatureCollection) -> Vec<MunicipalityRanking> {
    if let Some(missing) = RANKING_COLUMNS.iter().find(|c| !alerts.has_column(c)) {
        debug!(column = missing, "ranking column missing");
        return Vec::new();
    }

    let mut groups: BTreeMap<(String, String), Group> = BTreeMap::new();
    for f in alerts.iter() {
        let (Some(state), Some(municipality)) = (f.text("ESTADO"), f.text("MUNICIPIO")) else {
            continue;
        };
        groups.entry((state, municipality)).or_default().add(f);
    }

    let mut rows: Vec<MunicipalityRanking> = groups
        .into_iter()
        .map(|((state, municipality), g)| MunicipalityRanking {
            position: 0,
            state,
            municipality,
            total_area_ha: round_to(g.area_sum, 2),
            alert_count: g.area_count,
            mean_area_ha: if g.area_count > 0 {
                round_to(g.area_sum / g.area_count as f64, 2)
            } else {
                0.0
            },
            first_year: g.first_year,
            last_year: g.last_year,
            main_biome: mode(&g.biomes),
            pressure_vector: mode(&g.vectors),
        })
        .collect();

    rows.sort_by(|a, b| b.total_area_ha.total_cmp(&a.total_area_ha));
    for (i, row) in rows.iter_mut().enumerate() {
        row.position = i + 1;
    }
    rows
}

/// Alert area (`AREAHA`) summed per month of `DATADETEC`.
///
/// Alerts with an unparsable date or non-numeric area are skipped. The
/// series runs from the first to the last month with gaps set to 0.
pub fn monthly_alert_area(alerts: &FeatureCollection) -> Vec<MonthlyValue> {
    let mut buckets: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for f in alerts.iter() {
        let date = f.text("DATADETEC").and_then(|d| parse_datetime(&d));
        if let (Some(date), Some(area)) = (date, f.number("AREAHA")) {
            *buckets.entry(YearMonth::of(&date)).or_default() += area;
        }
    }
    contiguous_months(&buckets)
}
