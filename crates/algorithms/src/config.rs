//! Analysis configuration loaded from JSON

use serde::{Deserialize, Serialize};
use ucmonitor_core::{Error, Result, CRS};

use crate::coverage::SummaryParams;
use crate::fire::{FireFilter, RankingParams};
use crate::vector::PrepareParams;

/// Settings shared by the analyses.
///
/// Every field has a default, so a partial JSON document only overrides
/// what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// EPSG code of the planar CRS used for areas and centroids
    pub projected_crs: u32,
    /// EPSG code assigned to layers that declare no CRS
    pub source_crs: u32,
    /// EPSG code of layers handed to map rendering
    pub display_crs: u32,
    /// Douglas-Peucker tolerance in metres applied at load time
    pub simplify_tolerance_m: Option<f64>,
    pub ranking_chunk_size: usize,
    pub ranking_top_n: usize,
    pub chart_top_n: usize,
    pub fire_filter: FireFilter,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            projected_crs: 31983,
            source_crs: 4674,
            display_crs: 4326,
            simplify_tolerance_m: None,
            ranking_chunk_size: 50_000,
            ranking_top_n: 20,
            chart_top_n: 10,
            fire_filter: FireFilter::default(),
        }
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that codes are supported and sizes are usable
    pub fn validate(&self) -> Result<()> {
        if !self.projected_crs().is_projected() {
            return Err(invalid("projected_crs", self.projected_crs, "not a supported planar CRS"));
        }
        for (name, code) in [("source_crs", self.source_crs), ("display_crs", self.display_crs)] {
            let crs = CRS::from_epsg(code);
            if !crs.is_geographic() && !crs.is_projected() {
                return Err(invalid(name, code, "unsupported EPSG code"));
            }
        }
        if let Some(t) = self.simplify_tolerance_m {
            if !t.is_finite() || t < 0.0 {
                return Err(invalid("simplify_tolerance_m", t, "must be a non-negative number"));
            }
        }
        for (name, value) in [
            ("ranking_chunk_size", self.ranking_chunk_size),
            ("ranking_top_n", self.ranking_top_n),
            ("chart_top_n", self.chart_top_n),
        ] {
            if value == 0 {
                return Err(invalid(name, value, "must be positive"));
            }
        }
        self.fire_filter.validate()
    }

    pub fn projected_crs(&self) -> CRS {
        CRS::from_epsg(self.projected_crs)
    }

    pub fn source_crs(&self) -> CRS {
        CRS::from_epsg(self.source_crs)
    }

    pub fn display_crs(&self) -> CRS {
        CRS::from_epsg(self.display_crs)
    }

    /// Layer preparation settings; percentages on, all columns kept
    pub fn prepare_params(&self) -> PrepareParams {
        PrepareParams {
            default_crs: self.source_crs(),
            area_crs: self.projected_crs(),
            output_crs: self.display_crs(),
            simplify_tolerance_m: self.simplify_tolerance_m,
            ..Default::default()
        }
    }

    /// Coverage summary settings over every parcel
    pub fn summary_params(&self) -> SummaryParams {
        SummaryParams {
            projected_crs: self.projected_crs(),
            ..Default::default()
        }
    }

    pub fn ranking_params(&self) -> RankingParams {
        RankingParams {
            chunk_size: self.ranking_chunk_size,
            top_n: self.ranking_top_n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalysisConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.projected_crs(), CRS::sirgas2000_utm23s());
        assert_eq!(c.ranking_params().chunk_size, 50_000);
        assert_eq!(c.prepare_params().default_crs, CRS::sirgas2000());
        assert_eq!(c.prepare_params().output_crs, CRS::wgs84());
    }

    #[test]
    fn partial_document_overrides() {
        let c = AnalysisConfig::from_json_str(
            r#"{"projected_crs": 31982, "ranking_top_n": 5, "fire_filter": {"latitude_range": [-10.0, 0.0]}}"#,
        )
        .unwrap();
        assert_eq!(c.projected_crs, 31982);
        assert_eq!(c.ranking_params().top_n, 5);
        assert_eq!(c.chart_top_n, 10);
        assert_eq!(c.fire_filter.latitude_range, (-10.0, 0.0));
        assert_eq!(c.fire_filter.risk_range, (0.0, 1.0));
        assert_eq!(c.summary_params().projected_crs, CRS::from_epsg(31982));
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"projected_crs": 4326}"#),
            Err(Error::InvalidParameter { name: "projected_crs", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"ranking_chunk_size": 0}"#),
            Err(Error::InvalidParameter { name: "ranking_chunk_size", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"simplify_tolerance_m": -1.0}"#),
            Err(Error::InvalidParameter { name: "simplify_tolerance_m", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_json_str(r#"{"source_crs": 2154}"#),
            Err(Error::InvalidParameter { name: "source_crs", .. })
        ));
        assert!(matches!(AnalysisConfig::from_json_str("{"), Err(Error::Json(_))));
    }
}
