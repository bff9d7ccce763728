//! GeoJSON export of a prediction for map rendering.
//! Positions are written (lon, lat) as GeoJSON requires.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::classify::Zone;
use crate::cluster::Area;
use crate::coords::LatLon;
use crate::pipeline::PredictionResult;

fn position(p: LatLon) -> Vec<f64> {
    vec![p.lon, p.lat]
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn props(value: serde_json::Value) -> JsonObject {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

fn area_features(index: usize, area: &Area) -> [Feature; 2] {
    let ring: Vec<Vec<f64>> = area.polygon.iter().copied().map(position).collect();
    let polygon = feature(
        Value::Polygon(vec![ring]),
        props(json!({
            "kind": "area",
            "index": index,
            "count": area.count,
            "avg_confidence": area.avg_confidence,
            "center_lat": area.center_lat,
            "center_lon": area.center_lon,
        })),
    );
    let center = feature(
        Value::Point(position(area.center())),
        props(json!({
            "kind": "area_center",
            "index": index,
            "count": area.count,
        })),
    );
    [polygon, center]
}

fn zone_feature(zone: &Zone) -> Feature {
    feature(
        Value::Point(position(zone.position)),
        props(json!({
            "kind": "zone",
            "label": zone.label,
            "confidence": zone.confidence,
            "sst": zone.sst,
            "chl": zone.chl,
        })),
    )
}

/// Areas (polygon + centre point) followed by singleton zones.
pub fn to_feature_collection(result: &PredictionResult) -> FeatureCollection {
    let mut features = Vec::with_capacity(result.areas.len() * 2 + result.singletons.len());
    for (i, area) in result.areas.iter().enumerate() {
        features.extend(area_features(i, area));
    }
    features.extend(result.singletons.iter().map(zone_feature));

    let mut foreign = JsonObject::new();
    foreign.insert("date".to_string(), json!(result.date.format("%Y-%m-%d").to_string()));
    FeatureCollection { bbox: None, features, foreign_members: Some(foreign) }
}
