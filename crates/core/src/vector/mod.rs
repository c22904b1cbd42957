//! Vector data structures: features, attributes and layers

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crs::{Transformer, CRS};
use crate::error::{Error, Result};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value.
    ///
    /// Numbers convert directly, strings are parsed after trimming with a
    /// dot decimal separator only, so `"1,5"` and `"1.234,5"` yield `None`.
    /// Anything else, including NaN, yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            AttributeValue::Int(i) => *i as f64,
            AttributeValue::Float(f) => *f,
            AttributeValue::String(s) => s.trim().parse::<f64>().ok()?,
            AttributeValue::Null | AttributeValue::Bool(_) => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Text view of the value. Numbers are rendered, null is `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Bool(b) => Some(b.to_string()),
            AttributeValue::Int(i) => Some(i.to_string()),
            AttributeValue::Float(f) if f.is_nan() => None,
            AttributeValue::Float(f) => Some(f.to_string()),
            AttributeValue::String(s) => Some(s.clone()),
        }
    }

    /// True for `Null` and NaN floats
    pub fn is_null(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, Default)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// True when the attribute exists, even if null
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Numeric attribute, coerced. Missing or non-numeric yields `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(AttributeValue::as_f64)
    }

    /// Trimmed text attribute. Missing, null or blank yields `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        let text = self.properties.get(key)?.as_text()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Collection of features sharing a CRS
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            crs: None,
        }
    }

    /// Build a layer from features with a known CRS
    pub fn with_crs(features: Vec<Feature>, crs: CRS) -> Self {
        Self {
            features,
            crs: Some(crs),
        }
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Assign a CRS without touching coordinates
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Feature> {
        self.features.iter_mut()
    }

    /// New layer with the features matching `predicate`, same CRS
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Feature) -> bool,
    {
        Self {
            features: self.features.iter().filter(|f| predicate(f)).cloned().collect(),
            crs: self.crs.clone(),
        }
    }

    /// Sum of a numeric column. Missing or non-numeric values count as 0.
    pub fn sum_property(&self, key: &str) -> f64 {
        self.features.iter().filter_map(|f| f.number(key)).sum()
    }

    /// True when at least one feature carries the attribute
    pub fn has_column(&self, key: &str) -> bool {
        self.features.iter().any(|f| f.has_property(key))
    }

    /// Reproject every geometry to `target`.
    ///
    /// Fails with `MissingCrs` when the layer has no CRS.
    pub fn to_crs(&self, target: &CRS) -> Result<Self> {
        let source = self.crs.as_ref().ok_or(Error::MissingCrs)?;
        if source.is_equivalent(target) {
            let mut out = self.clone();
            out.crs = Some(target.clone());
            return Ok(out);
        }
        let transformer = Transformer::new(source, target)?;
        let features = self
            .features
            .iter()
            .map(|f| Feature {
                geometry: f.geometry.as_ref().map(|g| transformer.transform_geometry(g)),
                properties: f.properties.clone(),
                id: f.id.clone(),
            })
            .collect();
        Ok(Self::with_crs(features, target.clone()))
    }

    /// Append the features of `other`.
    ///
    /// When this layer has no CRS it adopts the other's. Layers with
    /// different CRSs fail with `CrsMismatch`.
    pub fn extend(&mut self, other: FeatureCollection) -> Result<()> {
        match (&self.crs, &other.crs) {
            (Some(a), Some(b)) if !a.is_equivalent(b) => {
                return Err(Error::CrsMismatch(a.identifier(), b.identifier()));
            }
            (None, Some(b)) => self.crs = Some(b.clone()),
            _ => {}
        }
        self.features.extend(other.features);
        Ok(())
    }

    /// Concatenate several layers into one
    pub fn concat(layers: impl IntoIterator<Item = FeatureCollection>) -> Result<Self> {
        let mut out = FeatureCollection::new();
        for layer in layers {
            out.extend(layer)?;
        }
        Ok(out)
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
            crs: None,
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Point};

    #[test]
    fn numeric_coercion() {
        assert_eq!(AttributeValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttributeValue::from(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(AttributeValue::from("1,5").as_f64(), None);
        assert_eq!(AttributeValue::from("1.234,5").as_f64(), None);
        assert_eq!(AttributeValue::from("1,234").as_f64(), None);
        assert_eq!(AttributeValue::from("abc").as_f64(), None);
        assert_eq!(AttributeValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(AttributeValue::Null.as_f64(), None);
        assert_eq!(AttributeValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn text_is_trimmed() {
        let f = Feature::empty()
            .with_property("nome_uc", "  APA Triunfo  ")
            .with_property("blank", "   ")
            .with_property("nada", AttributeValue::Null);
        assert_eq!(f.text("nome_uc").as_deref(), Some("APA Triunfo"));
        assert_eq!(f.text("blank"), None);
        assert_eq!(f.text("nada"), None);
        assert!(f.has_property("nada"));
        assert!(!f.has_property("outro"));
    }

    #[test]
    fn sum_and_columns() {
        let fc: FeatureCollection = vec![
            Feature::empty().with_property("alerta_km2", 1.5),
            Feature::empty().with_property("alerta_km2", "2"),
            Feature::empty(),
        ]
        .into_iter()
        .collect();
        assert!((fc.sum_property("alerta_km2") - 3.5).abs() < 1e-12);
        assert!(fc.has_column("alerta_km2"));
        assert!(!fc.has_column("sigef_km2"));
    }

    #[test]
    fn to_crs_requires_crs() {
        let fc: FeatureCollection = vec![Feature::new(Point::new(-45.0, -2.0).into())]
            .into_iter()
            .collect();
        assert!(matches!(fc.to_crs(&CRS::wgs84()), Err(Error::MissingCrs)));
    }

    #[test]
    fn to_crs_reprojects() {
        let fc = FeatureCollection::with_crs(
            vec![Feature::new(point!(x: -45.0, y: 0.0).into())],
            CRS::sirgas2000(),
        );
        let projected = fc.to_crs(&CRS::sirgas2000_utm23s()).unwrap();
        assert_eq!(projected.crs(), Some(&CRS::sirgas2000_utm23s()));
        match &projected.features[0].geometry {
            Some(Geometry::Point(p)) => {
                assert!((p.x() - 500_000.0).abs() < 1e-6);
                assert!((p.y() - 10_000_000.0).abs() < 1e-6);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn extend_checks_crs() {
        let mut a = FeatureCollection::with_crs(vec![Feature::empty()], CRS::wgs84());
        let b = FeatureCollection::with_crs(vec![Feature::empty()], CRS::sirgas2000_utm23s());
        assert!(matches!(a.extend(b), Err(Error::CrsMismatch(_, _))));

        let c = FeatureCollection::concat(vec![
            FeatureCollection::new(),
            FeatureCollection::with_crs(vec![Feature::empty(), Feature::empty()], CRS::wgs84()),
        ])
        .unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.crs(), Some(&CRS::wgs84()));
    }
}
