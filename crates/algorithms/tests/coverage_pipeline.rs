//! End-to-end coverage analysis on small GeoJSON layers near Altamira (PA).
//!
//! Layers are read without a CRS member, so they take the SIRGAS 2000
//! default like the files shipped by the agencies.

use ucmonitor_algorithms::coverage::{
    coverage_summary, parcel_occupancy, prepare_hectares, refresh_unit_alerts, unit_overlap_table, ParcelFilter,
    SummaryParams, UnitSelection,
};
use ucmonitor_algorithms::vector::{prepare_layer, PrepareParams};
use ucmonitor_core::io::{read_geojson_str, to_geojson_string};
use ucmonitor_core::{AttributeValue, CRS};

const UNITS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": {
        "nome_uc": "Estação Ecológica Terra do Meio",
        "municipio": "Altamira, São Félix do Xingu",
        "alerta_km2": 12.5,
        "c_alertas": 4
      },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-52.0, -6.1], [-51.9, -6.1], [-51.9, -6.0], [-52.0, -6.0], [-52.0, -6.1]]]
      }
    }
  ]
}"#;

const PARCELS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "invadindo": "SIGEF" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-52.0, -6.1], [-51.95, -6.1], [-51.95, -6.0], [-52.0, -6.0], [-52.0, -6.1]]]
      }
    },
    {
      "type": "Feature",
      "properties": { "invadindo": "CAR" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-50.0, -5.1], [-49.9, -5.1], [-49.9, -5.0], [-50.0, -5.0], [-50.0, -5.1]]]
      }
    }
  ]
}"#;

const ALERTS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "AREAHA": 30.0 },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-51.99, -6.09], [-51.98, -6.09], [-51.98, -6.08], [-51.99, -6.08], [-51.99, -6.09]]]
      }
    },
    {
      "type": "Feature",
      "properties": { "AREAHA": 7.5 },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-51.92, -6.02], [-51.91, -6.02], [-51.91, -6.01], [-51.92, -6.01], [-51.92, -6.02]]]
      }
    }
  ]
}"#;

fn layer(text: &str) -> ucmonitor_core::FeatureCollection {
    read_geojson_str(text, Some(CRS::sirgas2000())).unwrap()
}

#[test]
fn prepared_units_carry_area_and_percentages() {
    let units = prepare_layer(&layer(UNITS), &PrepareParams::default()).unwrap();
    assert_eq!(units.crs(), Some(&CRS::wgs84()));
    assert_eq!(units.len(), 1);

    let unit = &units.features[0];
    // 0.1 x 0.1 degree cell at 6 S, about 122 km² on the ground plus the
    // UTM 23S scale error seven degrees off the central meridian
    let area_km2 = unit.number("area_km2").unwrap();
    assert!((115.0..130.0).contains(&area_km2), "area_km2 = {area_km2}");

    let perc_alerta = unit.number("perc_alerta").unwrap();
    assert!((perc_alerta - 12.5 / area_km2 * 100.0).abs() < 1e-9);
    assert_eq!(unit.number("perc_sigef"), Some(0.0));
    assert_eq!(unit.get_property("id"), Some(&AttributeValue::String("0".into())));
}

#[test]
fn summary_with_parcel_category() {
    let units = layer(UNITS);
    let parcels = layer(PARCELS);

    let params = SummaryParams {
        parcel_filter: ParcelFilter::from_selection(Some("sigef")),
        ..Default::default()
    };
    let summary = coverage_summary(&units, &parcels, &params).unwrap();

    assert_eq!(summary.parcel_overlap_count, 1);
    assert!((summary.parcel_percent - 50.0).abs() <= 0.2, "{summary:?}");
    assert!((summary.parcel_km2 * 2.0 - summary.unit_km2).abs() / summary.unit_km2 < 0.01);
    assert_eq!(summary.alert_count, 4);
    assert_eq!(summary.municipality_count, 2);
    assert_eq!(summary.alert_km2, 12.5);

    let car_only = SummaryParams {
        parcel_filter: ParcelFilter::from_selection(Some("CAR")),
        ..Default::default()
    };
    let none = coverage_summary(&units, &parcels, &car_only).unwrap();
    assert_eq!(none.parcel_overlap_count, 0);
    assert_eq!(none.parcel_percent, 0.0);
}

#[test]
fn overlap_table_and_alert_refresh() {
    let units = layer(UNITS);
    let alerts = layer(ALERTS);
    let parcels = layer(PARCELS);
    let utm = CRS::sirgas2000_utm23s();

    let rows = unit_overlap_table(&units, &alerts, &parcels, &utm).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].alert_count, 2);
    assert_eq!(rows[0].parcel_count, 1);
    assert!(rows[0].alert_area_ha > 0.0);
    assert!((rows[0].parcel_area_ha * 2.0 - rows[0].unit_area_ha).abs() / rows[0].unit_area_ha < 0.01);

    let refreshed = refresh_unit_alerts(&units, &alerts, &utm).unwrap();
    let unit = &refreshed.features[0];
    assert_eq!(unit.number("alerta_ha"), Some(37.5));
    assert_eq!(unit.get_property("c_alertas"), Some(&AttributeValue::Int(2)));
}

#[test]
fn occupancy_from_hectare_columns() {
    let mut units = layer(UNITS);
    for unit in units.iter_mut() {
        unit.set_property("area_km2", AttributeValue::Float(120.0));
        unit.set_property("sigef_km2", AttributeValue::Float(30.0));
    }
    let units_ha = prepare_hectares(&units);
    let occupancy = parcel_occupancy(&units_ha, &UnitSelection::All).unwrap();
    assert_eq!(occupancy.unit_area_ha, 12_000.0);
    assert_eq!(occupancy.parcel_area_ha, 3_000.0);
    assert_eq!(occupancy.percent, 25.0);
    assert_eq!(occupancy.free_area_ha, 9_000.0);
}

#[test]
fn geojson_output_keeps_crs() {
    let units = prepare_layer(&layer(UNITS), &PrepareParams::default()).unwrap();
    let text = to_geojson_string(&units).unwrap();
    let back = read_geojson_str(&text, None).unwrap();
    assert_eq!(back.crs(), Some(&CRS::wgs84()));
    assert_eq!(back.len(), 1);
    assert_eq!(
        back.features[0].text("nome_uc").as_deref(),
        Some("Estação Ecológica Terra do Meio")
    );
}
