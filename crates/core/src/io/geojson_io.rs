//! GeoJSON reading/writing via the `geojson` crate
//!
//! The legacy named `crs` member (`{"type": "name", "properties": {"name":
//! "urn:ogc:def:crs:EPSG::4674"}}`) is honoured on read and written back
//! when the layer CRS has an EPSG code.

use geojson::{feature::Id, GeoJson, JsonObject, JsonValue};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};

/// Read a GeoJSON file into a `FeatureCollection`.
///
/// # Arguments
/// * `path` - File to read
/// * `default_crs` - CRS assigned when the file declares none
pub fn read_geojson<P: AsRef<Path>>(path: P, default_crs: Option<CRS>) -> Result<FeatureCollection> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let geojson = GeoJson::from_reader(reader)?;
    let fc = convert_document(geojson, default_crs)?;
    debug!(
        path = %path.as_ref().display(),
        features = fc.len(),
        "read GeoJSON layer"
    );
    Ok(fc)
}

/// Parse GeoJSON text into a `FeatureCollection`
pub fn read_geojson_str(text: &str, default_crs: Option<CRS>) -> Result<FeatureCollection> {
    let geojson = text.parse::<GeoJson>()?;
    convert_document(geojson, default_crs)
}

/// Write a `FeatureCollection` as GeoJSON
pub fn write_geojson<P: AsRef<Path>>(fc: &FeatureCollection, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(to_geojson_string(fc)?.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Serialize a `FeatureCollection` to GeoJSON text
pub fn to_geojson_string(fc: &FeatureCollection) -> Result<String> {
    let features = fc.iter().map(to_geojson_feature).collect();

    let foreign_members = fc.crs().and_then(CRS::epsg).map(|code| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
            }),
        );
        members
    });

    let collection = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    };
    Ok(serde_json::to_string(&GeoJson::FeatureCollection(collection))?)
}

fn convert_document(geojson: GeoJson, default_crs: Option<CRS>) -> Result<FeatureCollection> {
    let (features, members) = match geojson {
        GeoJson::FeatureCollection(collection) => (collection.features, collection.foreign_members),
        GeoJson::Feature(feature) => (vec![feature], None),
        GeoJson::Geometry(geometry) => (
            vec![geojson::Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            None,
        ),
    };

    let crs = members
        .as_ref()
        .and_then(declared_crs)
        .or(default_crs);

    let features = features
        .into_iter()
        .map(from_geojson_feature)
        .collect::<Result<Vec<_>>>()?;

    let mut fc = FeatureCollection::new();
    fc.features = features;
    fc.set_crs(crs);
    Ok(fc)
}

fn declared_crs(members: &JsonObject) -> Option<CRS> {
    let name = members.get("crs")?.get("properties")?.get("name")?.as_str()?;
    CRS::parse(name)
}

fn from_geojson_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature
        .geometry
        .map(geo_types::Geometry::<f64>::try_from)
        .transpose()
        .map_err(|e| Error::InvalidGeometry(e.to_string()))?;

    let properties = feature
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, from_json_value(v)))
        .collect();

    let id = feature.id.map(|id| match id {
        Id::String(s) => s,
        Id::Number(n) => n.to_string(),
    });

    Ok(Feature {
        geometry,
        properties,
        id,
    })
}

fn to_geojson_feature(feature: &Feature) -> geojson::Feature {
    let properties: JsonObject = feature
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), to_json_value(v)))
        .collect();

    geojson::Feature {
        bbox: None,
        geometry: feature
            .geometry
            .as_ref()
            .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
        id: feature.id.clone().map(Id::String),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn from_json_value(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n.as_f64().map_or(AttributeValue::Null, AttributeValue::Float),
        },
        JsonValue::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

fn to_json_value(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Int(i) => JsonValue::from(*i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        AttributeValue::String(s) => JsonValue::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4674" } },
        "features": [
            {
                "type": "Feature",
                "id": 7,
                "properties": { "nome_uc": "APA Triunfo do Xingu", "area_km2": 16795.5, "c_alertas": 12, "tags": ["a"] },
                "geometry": { "type": "Polygon", "coordinates": [[[-52,-6],[-51,-6],[-51,-5],[-52,-5],[-52,-6]]] }
            },
            {
                "type": "Feature",
                "properties": { "nome_uc": null },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn reads_named_crs_and_properties() {
        let fc = read_geojson_str(UNITS, None).unwrap();
        assert_eq!(fc.crs(), Some(&CRS::sirgas2000()));
        assert_eq!(fc.len(), 2);

        let first = &fc.features[0];
        assert_eq!(first.id.as_deref(), Some("7"));
        assert_eq!(first.text("nome_uc").as_deref(), Some("APA Triunfo do Xingu"));
        assert_eq!(first.get_property("c_alertas"), Some(&AttributeValue::Int(12)));
        assert_eq!(first.get_property("tags"), Some(&AttributeValue::from("[\"a\"]")));
        assert!(matches!(first.geometry, Some(geo_types::Geometry::Polygon(_))));

        assert!(fc.features[1].geometry.is_none());
        assert!(fc.features[1].get_property("nome_uc").unwrap().is_null());
    }

    #[test]
    fn default_crs_applies_without_member() {
        let text = r#"{"type":"FeatureCollection","features":[]}"#;
        assert_eq!(read_geojson_str(text, None).unwrap().crs(), None);
        let fc = read_geojson_str(text, Some(CRS::sirgas2000())).unwrap();
        assert_eq!(fc.crs(), Some(&CRS::sirgas2000()));
    }

    #[test]
    fn invalid_text_is_an_error() {
        assert!(matches!(read_geojson_str("{not json", None), Err(Error::GeoJson(_))));
    }

    #[test]
    fn written_layer_reads_back() {
        let fc = read_geojson_str(UNITS, None).unwrap();
        let text = to_geojson_string(&fc).unwrap();
        assert!(text.contains("urn:ogc:def:crs:EPSG::4674"));

        let back = read_geojson_str(&text, None).unwrap();
        assert_eq!(back.crs(), Some(&CRS::sirgas2000()));
        assert_eq!(back.len(), 2);
        assert_eq!(back.features[0].number("area_km2"), Some(16795.5));
    }

    #[test]
    fn file_roundtrip() {
        let fc = read_geojson_str(UNITS, None).unwrap();
        let path = std::env::temp_dir().join(format!("ucmonitor_io_{}.geojson", std::process::id()));
        write_geojson(&fc, &path).unwrap();
        let back = read_geojson(&path, None).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.len(), fc.len());
    }
}
