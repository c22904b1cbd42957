//! Chunked municipality rankings of fire records

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;
use ucmonitor_core::{Algorithm, Error, Result};

use super::FireRecord;
use crate::format::round_to;
use crate::maybe_rayon::*;

/// Quantity a ranking is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RankingTheme {
    /// Ordered by mean fire risk
    #[default]
    FireRisk,
    /// Ordered by the largest single precipitation event
    Precipitation,
    /// Ordered by the longest dry spell
    DryDays,
}

impl RankingTheme {
    fn value(self, r: &FireRecord) -> Option<f64> {
        match self {
            RankingTheme::FireRisk => r.fire_risk,
            RankingTheme::Precipitation => r.precipitation,
            RankingTheme::DryDays => r.dry_days,
        }
        .filter(|v| v.is_finite())
    }

    fn decimals(self) -> u32 {
        match self {
            RankingTheme::FireRisk => 4,
            RankingTheme::Precipitation => 2,
            RankingTheme::DryDays => 1,
        }
    }

    /// Ranked column: the mean for risk, the maximum otherwise
    fn key(self, row: &FireRankingRow) -> f64 {
        match self {
            RankingTheme::FireRisk => row.mean,
            RankingTheme::Precipitation | RankingTheme::DryDays => row.max,
        }
    }
}

/// Parameters for [`rank_municipalities`]
#[derive(Debug, Clone)]
pub struct RankingParams {
    /// Records aggregated per chunk before merging
    pub chunk_size: usize,
    /// Rows kept
    pub top_n: usize,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            chunk_size: 50_000,
            top_n: 20,
        }
    }
}

/// One ranked municipality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireRankingRow {
    /// 1-based rank
    pub position: usize,
    pub municipality: String,
    pub mean: f64,
    pub max: f64,
    /// Total precipitation; only for [`RankingTheme::Precipitation`]
    pub sum: Option<f64>,
    /// Records with a value for the theme
    pub count: usize,
    pub first_seen: Option<NaiveDateTime>,
    pub last_seen: Option<NaiveDateTime>,
}

/// Running aggregate of one municipality
#[derive(Debug, Clone, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
    max: Option<f64>,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
}

impl Accumulator {
    fn add(&mut self, value: Option<f64>, at: Option<NaiveDateTime>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
        if let Some(t) = at {
            self.first = Some(self.first.map_or(t, |f| f.min(t)));
            self.last = Some(self.last.map_or(t, |l| l.max(t)));
        }
    }

    fn merge(&mut self, other: Accumulator) {
        self.sum += other.sum;
        self.count += other.count;
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.first = match (self.first, other.first) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.last = match (self.last, other.last) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

fn aggregate_chunk(chunk: &[FireRecord], theme: RankingTheme) -> HashMap<String, Accumulator> {
    let mut groups: HashMap<String, Accumulator> = HashMap::new();
    for r in chunk {
        if let Some(m) = r.municipality_name() {
            groups.entry(m.to_string()).or_default().add(theme.value(r), r.timestamp);
        }
    }
    groups
}

/// Rank municipalities by a fire theme.
///
/// Records are aggregated per municipality in chunks of
/// `params.chunk_size`, in parallel when the `parallel` feature is on,
/// and the partial aggregates are merged exactly. Records without a
/// municipality are ignored; municipalities with no value for the theme
/// are left out. Values are rounded to 4 (risk), 2 (precipitation) or 1
/// (dry days) decimals before ranking; ties are ordered by name.
///
/// # Arguments
/// * `records` - Fire records, usually pre-filtered with `FireFilter`
/// * `theme` - Ranked quantity
/// * `params` - Chunk size and number of rows
///
/// # Returns
/// At most `params.top_n` rows, or `InvalidParameter` for a zero chunk size
pub fn rank_municipalities(
    records: &[FireRecord],
    theme: RankingTheme,
    params: &RankingParams,
) -> Result<Vec<FireRankingRow>> {
    if params.chunk_size == 0 {
        return Err(Error::InvalidParameter {
            name: "chunk_size",
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let partials: Vec<HashMap<String, Accumulator>> = records
        .par_chunks(params.chunk_size)
        .map(|chunk| aggregate_chunk(chunk, theme))
        .collect();
    let chunks = partials.len();

    let mut merged: HashMap<String, Accumulator> = HashMap::new();
    for partial in partials {
        for (municipality, acc) in partial {
            merged.entry(municipality).or_default().merge(acc);
        }
    }

    let decimals = theme.decimals();
    let mut rows: Vec<FireRankingRow> = merged
        .into_iter()
        .filter_map(|(municipality, acc)| {
            let max = acc.max?;
            Some(FireRankingRow {
                position: 0,
                municipality,
                mean: round_to(acc.sum / acc.count as f64, decimals),
                max: round_to(max, decimals),
                sum: (theme == RankingTheme::Precipitation).then(|| round_to(acc.sum, decimals)),
                count: acc.count,
                first_seen: acc.first,
                last_seen: acc.last,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        theme
            .key(b)
            .total_cmp(&theme.key(a))
            .then_with(|| a.municipality.cmp(&b.municipality))
    });
    rows.truncate(params.top_n);
    for (i, row) in rows.iter_mut().enumerate() {
        row.position = i + 1;
    }

    debug!(?theme, records = records.len(), chunks, rows = rows.len(), "fire ranking");
    Ok(rows)
}

/// Fire ranking algorithm
#[derive(Debug, Clone, Default)]
pub struct FireRanking;

impl Algorithm for FireRanking {
    type Input = (Vec<FireRecord>, RankingTheme);
    type Output = Vec<FireRankingRow>;
    type Params = RankingParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "FireRanking"
    }

    fn description(&self) -> &'static str {
        "Top municipalities by fire risk, precipitation or dry days"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (records, theme) = input;
        rank_municipalities(&records, theme, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fire::tests::record;

    fn sample() -> Vec<FireRecord> {
        vec![
            record("Altamira", (2023, 3, 1), 0.9, 10.0, 5.0),
            record("Altamira", (2023, 1, 1), 0.5, 80.0, 2.0),
            record("Itaituba", (2023, 2, 1), 0.8, 20.0, 30.0),
            record("Itaituba", (2023, 2, 9), 0.6, 5.5, 12.0),
            record("Marabá", (2023, 6, 1), 0.12346, 0.0, 1.0),
            FireRecord {
                municipality: None,
                ..record("x", (2023, 1, 1), 1.0, 999.0, 999.0)
            },
        ]
    }

    #[test]
    fn risk_ranked_by_mean() {
        let rows = rank_municipalities(&sample(), RankingTheme::FireRisk, &RankingParams::default()).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.municipality.as_str()).collect();
        // Altamira and Itaituba tie on 0.7; the name breaks it
        assert_eq!(names, vec!["Altamira", "Itaituba", "Marabá"]);
        assert_eq!(rows[0].position, 1);
        assert!((rows[0].mean - 0.7).abs() < 1e-12);
        assert_eq!(rows[0].max, 0.9);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].sum, None);
        assert_eq!(rows[2].mean, 0.1235);
        assert_eq!(
            rows[0].first_seen.map(|t| t.date().to_string()).as_deref(),
            Some("2023-01-01")
        );
        assert_eq!(rows[0].last_seen.map(|t| t.date().to_string()).as_deref(), Some("2023-03-01"));
    }

    #[test]
    fn precipitation_ranked_by_max() {
        let rows = rank_municipalities(&sample(), RankingTheme::Precipitation, &RankingParams::default()).unwrap();
        assert_eq!(rows[0].municipality, "Altamira");
        assert_eq!(rows[0].max, 80.0);
        assert_eq!(rows[0].sum, Some(90.0));
        assert_eq!(rows[1].municipality, "Itaituba");
        assert_eq!(rows[1].mean, 12.75);
    }

    #[test]
    fn dry_days_ranked_by_max() {
        let params = RankingParams {
            top_n: 1,
            ..Default::default()
        };
        let rows = rank_municipalities(&sample(), RankingTheme::DryDays, &params).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].municipality, "Itaituba");
        assert_eq!(rows[0].max, 30.0);
        assert_eq!(rows[0].mean, 21.0);
    }

    #[test]
    fn chunking_does_not_change_result() {
        let records = sample();
        let whole = rank_municipalities(&records, RankingTheme::FireRisk, &RankingParams::default()).unwrap();
        let chunked = rank_municipalities(
            &records,
            RankingTheme::FireRisk,
            &RankingParams {
                chunk_size: 2,
                top_n: 20,
            },
        )
        .unwrap();
        assert_eq!(whole, chunked);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let params = RankingParams {
            chunk_size: 0,
            top_n: 20,
        };
        assert!(matches!(
            rank_municipalities(&sample(), RankingTheme::FireRisk, &params),
            Err(Error::InvalidParameter { name: "chunk_size", .. })
        ));
    }

    #[test]
    fn algorithm_trait() {
        let rows = FireRanking.execute_default((sample(), RankingTheme::DryDays)).unwrap();
        assert_eq!(rows.len(), 3);
    }
}
