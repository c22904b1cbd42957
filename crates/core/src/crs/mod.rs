//! Coordinate Reference System handling

mod transform;
pub mod utm;

pub use transform::Transformer;
pub use utm::{Ellipsoid, UtmZone};

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of WGS84 geographic coordinates
pub const EPSG_WGS84: u32 = 4326;
/// EPSG code of SIRGAS 2000 geographic coordinates
pub const EPSG_SIRGAS2000: u32 = 4674;
/// EPSG code of SIRGAS 2000 / UTM zone 23S
pub const EPSG_SIRGAS2000_UTM23S: u32 = 31983;
/// EPSG code of Web Mercator
pub const EPSG_WEB_MERCATOR: u32 = 3857;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation (primary)
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// Parse identifiers such as `EPSG:4674`, `epsg:31983`,
    /// `urn:ogc:def:crs:EPSG::4674` or `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        if trimmed.ends_with("CRS84") {
            return Some(Self::wgs84());
        }
        let upper = trimmed.to_ascii_uppercase();
        let pos = upper.rfind("EPSG")?;
        let code = upper[pos + 4..].trim_start_matches(':');
        code.parse::<u32>().ok().map(Self::from_epsg)
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(EPSG_WGS84)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(EPSG_WEB_MERCATOR)
    }

    /// SIRGAS 2000 geographic CRS (EPSG:4674), the default of Brazilian
    /// cadastral sources.
    pub fn sirgas2000() -> Self {
        Self::from_epsg(EPSG_SIRGAS2000)
    }

    /// SIRGAS 2000 / UTM zone 23S (EPSG:31983), the planar CRS used for
    /// area computation.
    pub fn sirgas2000_utm23s() -> Self {
        Self::from_epsg(EPSG_SIRGAS2000_UTM23S)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// True for latitude/longitude systems (WGS84, SIRGAS 2000)
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, Some(EPSG_WGS84) | Some(EPSG_SIRGAS2000))
    }

    /// True for supported planar systems (UTM zones, Web Mercator)
    pub fn is_projected(&self) -> bool {
        match self.epsg {
            Some(EPSG_WEB_MERCATOR) => true,
            Some(code) => UtmZone::from_epsg(code).is_some(),
            None => false,
        }
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        // Simple check: if both have EPSG codes, compare them
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // If both have WKT, compare (this is imperfect)
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        // If both have PROJ, compare
        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            // Return first 50 chars of WKT
            let end = wkt
                .char_indices()
                .nth(50)
                .map(|(i, _)| i)
                .unwrap_or(wkt.len());
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4674);
        assert_eq!(crs.epsg(), Some(4674));
        assert_eq!(crs.identifier(), "EPSG:4674");
    }

    #[test]
    fn test_crs_equivalence() {
        let a = CRS::from_epsg(31983);
        let b = CRS::sirgas2000_utm23s();
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&CRS::sirgas2000()));
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!(CRS::parse("EPSG:4674"), Some(CRS::sirgas2000()));
        assert_eq!(CRS::parse("urn:ogc:def:crs:EPSG::31983"), Some(CRS::sirgas2000_utm23s()));
        assert_eq!(CRS::parse("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(CRS::wgs84()));
        assert_eq!(CRS::parse("epsg:3857"), Some(CRS::web_mercator()));
        assert_eq!(CRS::parse("not a crs"), None);
    }

    #[test]
    fn test_geographic_vs_projected() {
        assert!(CRS::sirgas2000().is_geographic());
        assert!(!CRS::sirgas2000().is_projected());
        assert!(CRS::sirgas2000_utm23s().is_projected());
        assert!(CRS::from_epsg(32723).is_projected());
        assert!(!CRS::from_epsg(2154).is_projected());
        assert!(!CRS::from_wkt("GEOGCS[...]").is_geographic());
    }
}
