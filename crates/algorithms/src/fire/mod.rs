//! INPE fire-risk records
//!
//! Point observations of fire risk, precipitation and days without rain
//! per municipality. Provides plausibility filtering, chunked
//! municipality rankings, monthly risk series and summary figures.

mod ranking;
mod stats;

pub use ranking::{rank_municipalities, FireRanking, FireRankingRow, RankingParams, RankingTheme};
pub use stats::{fire_summary, monthly_mean_risk, top_municipalities, FireMetric, FireSummary, MunicipalityValue};

use chrono::{Datelike, NaiveDateTime};
use geo::{Geometry, Point};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use ucmonitor_core::{AttributeValue, Error, Feature, FeatureCollection, Result, CRS};

use crate::timeseries::{parse_datetime, YearFilter};

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

/// One fire-risk observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireRecord {
    #[serde(default, alias = "datahora", alias = "DataHora", deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<NaiveDateTime>,
    /// Fire risk index in [0, 1]
    #[serde(default, alias = "riscofogo", alias = "RiscoFogo")]
    pub fire_risk: Option<f64>,
    /// Precipitation in mm
    #[serde(default, alias = "precipitacao", alias = "Precipitacao")]
    pub precipitation: Option<f64>,
    #[serde(default, alias = "municipio", alias = "mun_corrigido")]
    pub municipality: Option<String>,
    #[serde(default, alias = "diasemchuva", alias = "DiaSemChuva")]
    pub dry_days: Option<f64>,
    #[serde(default, alias = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "Longitude")]
    pub longitude: Option<f64>,
}

impl FireRecord {
    /// Trimmed municipality name, `None` when blank
    pub fn municipality_name(&self) -> Option<&str> {
        self.municipality.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    pub fn year(&self) -> Option<i32> {
        self.timestamp.map(|t| t.year())
    }
}

/// Plausibility bounds for fire records.
///
/// A record passes only when every bounded value is present and within
/// its range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireFilter {
    pub risk_range: (f64, f64),
    pub min_precipitation: f64,
    pub min_dry_days: f64,
    pub latitude_range: (f64, f64),
    pub longitude_range: (f64, f64),
}

impl Default for FireFilter {
    fn default() -> Self {
        Self {
            risk_range: (0.0, 1.0),
            min_precipitation: 0.0,
            min_dry_days: 0.0,
            latitude_range: (-15.0, 5.0),
            longitude_range: (-60.0, -45.0),
        }
    }
}

fn within(value: Option<f64>, (lo, hi): (f64, f64)) -> bool {
    value.is_some_and(|v| v >= lo && v <= hi)
}

fn check_range(name: &'static str, (lo, hi): (f64, f64)) -> Result<()> {
    if lo.is_finite() && hi.is_finite() && lo <= hi {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: format!("({lo}, {hi})"),
            reason: "bounds must be finite with min <= max".to_string(),
        })
    }
}

impl FireFilter {
    pub fn accepts(&self, r: &FireRecord) -> bool {
        within(r.fire_risk, self.risk_range)
            && r.precipitation.is_some_and(|p| p >= self.min_precipitation)
            && r.dry_days.is_some_and(|d| d >= self.min_dry_days)
            && within(r.latitude, self.latitude_range)
            && within(r.longitude, self.longitude_range)
    }

    /// Records passing the filter
    pub fn apply(&self, records: &[FireRecord]) -> Vec<FireRecord> {
        records.iter().filter(|r| self.accepts(r)).cloned().collect()
    }

    pub fn validate(&self) -> Result<()> {
        check_range("fire_filter.risk_range", self.risk_range)?;
        check_range("fire_filter.latitude_range", self.latitude_range)?;
        check_range("fire_filter.longitude_range", self.longitude_range)?;
        for (name, value) in [
            ("fire_filter.min_precipitation", self.min_precipitation),
            ("fire_filter.min_dry_days", self.min_dry_days),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Sorted distinct years of the record timestamps
pub fn available_years(records: &[FireRecord]) -> Vec<i32> {
    records
        .iter()
        .filter_map(FireRecord::year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Records observed in the selected year
pub fn filter_year(records: &[FireRecord], year: YearFilter) -> Vec<FireRecord> {
    records.iter().filter(|r| year.matches(r.year())).cloned().collect()
}

/// EPSG:4326 point layer of mappable records.
///
/// Records need coordinates, a municipality and a risk in [0, 1].
/// Negative precipitation excludes a record; missing precipitation maps
/// to 0.
pub fn hotspot_points(records: &[FireRecord]) -> FeatureCollection {
    let features = records
        .iter()
        .filter_map(|r| {
            let (lat, lon) = (r.latitude?, r.longitude?);
            let municipality = r.municipality_name()?;
            let risk = r.fire_risk.filter(|v| (0.0..=1.0).contains(v))?;
            let precipitation = match r.precipitation {
                Some(p) if p < 0.0 => return None,
                Some(p) => p,
                None => 0.0,
            };
            let mut f = Feature::new(Geometry::Point(Point::new(lon, lat)))
                .with_property("municipio", municipality)
                .with_property("risco_fogo", risk)
                .with_property("precipitacao", precipitation);
            if let Some(t) = r.timestamp {
                f.set_property("datahora", AttributeValue::String(t.format("%Y-%m-%d %H:%M:%S").to_string()));
            }
            Some(f)
        })
        .collect();
    FeatureCollection::with_crs(features, CRS::wgs84())
}
