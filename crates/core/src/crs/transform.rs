//! Coordinate transformation between supported CRSs.
//!
//! Every transform goes through geographic coordinates. WGS84 and SIRGAS 2000
//! geographic coordinates are treated as identical (the datum shift is
//! below one metre).

use geo::{Coord, Geometry, MapCoords};
use std::f64::consts::FRAC_PI_4;

use super::{UtmZone, CRS, EPSG_SIRGAS2000, EPSG_WEB_MERCATOR, EPSG_WGS84};
use crate::error::{Error, Result};

const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Projection {
    Geographic,
    Utm(UtmZone),
    WebMercator,
}

impl Projection {
    fn from_crs(crs: &CRS) -> Result<Self> {
        match crs.epsg() {
            Some(EPSG_WGS84) | Some(EPSG_SIRGAS2000) => Ok(Projection::Geographic),
            Some(EPSG_WEB_MERCATOR) => Ok(Projection::WebMercator),
            Some(code) => UtmZone::from_epsg(code)
                .map(Projection::Utm)
                .ok_or_else(|| Error::UnsupportedCrs(crs.identifier())),
            None => Err(Error::UnsupportedCrs(crs.identifier())),
        }
    }

    fn to_geographic(&self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Projection::Geographic => c,
            Projection::Utm(zone) => {
                let (x, y) = zone.inverse(c.x, c.y);
                Coord { x, y }
            }
            Projection::WebMercator => Coord {
                x: (c.x / WEB_MERCATOR_RADIUS).to_degrees(),
                y: (2.0 * (c.y / WEB_MERCATOR_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2)
                    .to_degrees(),
            },
        }
    }

    fn from_geographic(&self, c: Coord<f64>) -> Coord<f64> {
        match self {
            Projection::Geographic => c,
            Projection::Utm(zone) => {
                let (x, y) = zone.forward(c.x, c.y);
                Coord { x, y }
            }
            Projection::WebMercator => Coord {
                x: WEB_MERCATOR_RADIUS * c.x.to_radians(),
                y: WEB_MERCATOR_RADIUS * (FRAC_PI_4 + c.y.to_radians() / 2.0).tan().ln(),
            },
        }
    }
}

/// Reprojects coordinates from one CRS to another
#[derive(Debug, Clone)]
pub struct Transformer {
    source: Projection,
    target: Projection,
}

impl Transformer {
    /// Build a transformer between two CRSs.
    ///
    /// Fails with `UnsupportedCrs` when either side is not a known EPSG code.
    pub fn new(source: &CRS, target: &CRS) -> Result<Self> {
        Ok(Self {
            source: Projection::from_crs(source)?,
            target: Projection::from_crs(target)?,
        })
    }

    /// True when coordinates pass through unchanged
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// Transform a single coordinate
    pub fn transform_coord(&self, c: Coord<f64>) -> Coord<f64> {
        if self.is_identity() {
            return c;
        }
        self.target.from_geographic(self.source.to_geographic(c))
    }

    /// Transform every coordinate of a geometry
    pub fn transform_geometry(&self, geom: &Geometry<f64>) -> Geometry<f64> {
        if self.is_identity() {
            return geom.clone();
        }
        geom.map_coords(|c| self.transform_coord(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    #[test]
    fn geographic_datums_are_identity() {
        let t = Transformer::new(&CRS::sirgas2000(), &CRS::wgs84()).unwrap();
        assert!(t.is_identity());
        let c = t.transform_coord(Coord { x: -48.5, y: -1.45 });
        assert_eq!(c, Coord { x: -48.5, y: -1.45 });
    }

    #[test]
    fn unsupported_crs_is_rejected() {
        let err = Transformer::new(&CRS::from_epsg(2154), &CRS::wgs84()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCrs(_)));

        let err = Transformer::new(&CRS::wgs84(), &CRS::from_wkt("LOCAL_CS[]")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCrs(_)));
    }

    #[test]
    fn web_mercator_roundtrip() {
        let fwd = Transformer::new(&CRS::wgs84(), &CRS::web_mercator()).unwrap();
        let inv = Transformer::new(&CRS::web_mercator(), &CRS::wgs84()).unwrap();
        let c = Coord { x: -52.0, y: -3.2 };
        let back = inv.transform_coord(fwd.transform_coord(c));
        assert!((back.x - c.x).abs() < 1e-9);
        assert!((back.y - c.y).abs() < 1e-9);
    }

    #[test]
    fn polygon_to_utm_is_in_metres() {
        let t = Transformer::new(&CRS::sirgas2000(), &CRS::sirgas2000_utm23s()).unwrap();
        let square = Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (-45.0, -2.0),
                (-44.99, -2.0),
                (-44.99, -1.99),
                (-45.0, -1.99),
                (-45.0, -2.0),
            ]),
            vec![],
        ));
        let projected = t.transform_geometry(&square);
        if let Geometry::Polygon(p) = projected {
            let first = p.exterior().0[0];
            assert!((first.x - 500_000.0).abs() < 0.01);
            assert!(first.y > 9_700_000.0 && first.y < 9_800_000.0);
        } else {
            panic!("expected polygon");
        }
    }
}
