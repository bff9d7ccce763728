//! Authoritative land geometry loaded from GeoJSON.
//!
//! GeoJSON positions are WGS84 longitude/latitude, which is the coordinate
//! reference the grid uses, so no reprojection is needed. Legacy files that
//! declare a different `crs` cannot be reprojected here and are rejected as
//! unavailable; the caller then runs heuristic-only.

use std::fmt;
use std::path::Path;

use geo::{BoundingRect, Contains, Geometry, MultiPolygon, Point, Rect};
use geojson::{GeoJson, JsonObject};
use tracing::{debug, warn};

use crate::coords::LatLon;
use crate::error::{PfzError, Result};

const RESOURCE: &str = "land polygons";

/// Names accepted for a legacy `crs` member.
const GEOGRAPHIC_CRS_NAMES: [&str; 4] = [
    "EPSG:4326",
    "urn:ogc:def:crs:EPSG::4326",
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "CRS84",
];

/// A source of authoritative land polygons.
///
/// Lookups may fail (e.g. a remote or lazily-loaded dataset); the land/water
/// classifier treats any error as "no answer" and keeps the heuristic result.
pub trait LandGeometry: Send + Sync + fmt::Debug {
    /// `true` if the point lies strictly inside a land polygon.
    fn contains(&self, p: LatLon) -> Result<bool>;

    /// Short human-readable label for diagnostics.
    fn describe(&self) -> String;
}

/// In-memory polygon set with per-polygon bounding-box prefilter.
#[derive(Debug, Clone)]
pub struct PolygonSet {
    polygons: Vec<(Rect<f64>, MultiPolygon<f64>)>,
}

impl PolygonSet {
    /// Build from already-parsed geometries. Non-areal geometries are skipped.
    pub fn from_geometries(geometries: impl IntoIterator<Item = Geometry<f64>>) -> Result<Self> {
        let mut polygons = Vec::new();
        let mut skipped = 0usize;
        for g in geometries {
            let mp = match g {
                Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                Geometry::MultiPolygon(mp) => mp,
                Geometry::GeometryCollection(gc) => {
                    let inner: Vec<_> = gc
                        .0
                        .into_iter()
                        .flat_map(|g| match g {
                            Geometry::Polygon(p) => vec![p],
                            Geometry::MultiPolygon(mp) => mp.0,
                            _ => Vec::new(),
                        })
                        .collect();
                    MultiPolygon::new(inner)
                }
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            match mp.bounding_rect() {
                Some(rect) => polygons.push((rect, mp)),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "ignored non-areal or empty land geometries");
        }
        if polygons.is_empty() {
            return Err(PfzError::unavailable(RESOURCE, "no polygon geometries in dataset"));
        }
        Ok(Self { polygons })
    }

    /// Parse a GeoJSON document (Geometry, Feature or FeatureCollection).
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        let gj: GeoJson = text
            .parse()
            .map_err(|e: geojson::Error| PfzError::unavailable(RESOURCE, e.to_string()))?;

        let geometries: Vec<geojson::Geometry> = match gj {
            GeoJson::Geometry(g) => vec![g],
            GeoJson::Feature(f) => {
                check_crs(f.foreign_members.as_ref())?;
                f.geometry.into_iter().collect()
            }
            GeoJson::FeatureCollection(fc) => {
                check_crs(fc.foreign_members.as_ref())?;
                fc.features.into_iter().filter_map(|f| f.geometry).collect()
            }
        };

        let mut converted = Vec::with_capacity(geometries.len());
        for g in geometries {
            match Geometry::<f64>::try_from(g) {
                Ok(geo) => converted.push(geo),
                Err(e) => warn!(error = %e, "skipping unconvertible land geometry"),
            }
        }
        Self::from_geometries(converted)
    }

    /// Load a GeoJSON file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PfzError::unavailable(RESOURCE, format!("{}: {e}", path.display())))?;
        let set = Self::from_geojson_str(&text)?;
        debug!(path = %path.display(), polygons = set.len(), "loaded land polygons");
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

impl LandGeometry for PolygonSet {
    fn contains(&self, p: LatLon) -> Result<bool> {
        if !p.is_finite() {
            return Err(PfzError::unavailable(RESOURCE, format!("non-finite query point {p:?}")));
        }
        let pt = Point::new(p.lon, p.lat);
        Ok(self
            .polygons
            .iter()
            .filter(|(rect, _)| rect_covers(rect, p))
            .any(|(_, mp)| mp.contains(&pt)))
    }

    fn describe(&self) -> String {
        format!("geojson ({} polygons)", self.polygons.len())
    }
}

fn rect_covers(rect: &Rect<f64>, p: LatLon) -> bool {
    let (min, max) = (rect.min(), rect.max());
    p.lon >= min.x && p.lon <= max.x && p.lat >= min.y && p.lat <= max.y
}

/// Reject datasets that declare a non-geographic coordinate reference.
fn check_crs(foreign: Option<&JsonObject>) -> Result<()> {
    let Some(crs) = foreign.and_then(|m| m.get("crs")) else {
        return Ok(());
    };
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or_default();
    if GEOGRAPHIC_CRS_NAMES.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        Ok(())
    } else {
        Err(PfzError::unavailable(
            RESOURCE,
            format!("unsupported coordinate reference {name:?}, expected EPSG:4326"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SQUARE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "island"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[10.0, 35.0], [11.0, 35.0], [11.0, 36.0], [10.0, 36.0], [10.0, 35.0]]]
            }
        }, {
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Point", "coordinates": [9.0, 34.0]}
        }]
    }"#;

    #[test]
    fn point_inside_polygon_is_land() {
        let set = PolygonSet::from_geojson_str(SQUARE).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(LatLon::new(35.5, 10.5)).unwrap());
        assert!(!set.contains(LatLon::new(35.5, 11.5)).unwrap());
    }

    #[test]
    fn axis_order_is_lon_lat() {
        let set = PolygonSet::from_geojson_str(SQUARE).unwrap();
        // Swapped coordinates must not hit the square.
        assert!(!set.contains(LatLon::new(10.5, 35.5)).unwrap());
    }

    #[test]
    fn bare_geometry_document_is_accepted() {
        let gj = r#"{"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,1],[0,0]]]]}"#;
        let set = PolygonSet::from_geojson_str(gj).unwrap();
        assert!(set.contains(LatLon::new(0.5, 0.5)).unwrap());
    }

    #[test]
    fn non_geographic_crs_is_unavailable() {
        let gj = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32632"}},
            "features": []
        }"#;
        let err = PolygonSet::from_geojson_str(gj).unwrap_err();
        assert!(matches!(err, PfzError::OptionalDataUnavailable { .. }), "{err}");
    }

    #[test]
    fn geographic_crs_is_accepted() {
        let gj = SQUARE.replacen(
            "\"type\": \"FeatureCollection\",",
            "\"type\": \"FeatureCollection\", \"crs\": {\"type\": \"name\", \"properties\": {\"name\": \"EPSG:4326\"}},",
            1,
        );
        assert!(PolygonSet::from_geojson_str(&gj).is_ok());
    }

    #[test]
    fn only_points_is_unavailable() {
        let gj = r#"{"type": "Point", "coordinates": [9.0, 34.0]}"#;
        assert!(matches!(
            PolygonSet::from_geojson_str(gj),
            Err(PfzError::OptionalDataUnavailable { .. })
        ));
    }

    #[test]
    fn malformed_json_is_unavailable() {
        assert!(matches!(
            PolygonSet::from_geojson_str("{not json"),
            Err(PfzError::OptionalDataUnavailable { .. })
        ));
    }

    #[test]
    fn loads_from_disk_and_reports_missing_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SQUARE.as_bytes()).unwrap();
        let set = PolygonSet::load(f.path()).unwrap();
        assert_eq!(set.describe(), "geojson (1 polygons)");

        let missing = PolygonSet::load(Path::new("/nonexistent/coast.geojson"));
        assert!(matches!(missing, Err(PfzError::OptionalDataUnavailable { .. })));
    }

    #[test]
    fn non_finite_query_is_an_error() {
        let set = PolygonSet::from_geojson_str(SQUARE).unwrap();
        assert!(set.contains(LatLon::new(f64::NAN, 10.5)).is_err());
    }
}
