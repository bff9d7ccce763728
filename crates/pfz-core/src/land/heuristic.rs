//! Hand-tuned "known land" rectangles approximating the Tunisian coastline.
//!
//! The table is literal configuration, not geometry: each region is an
//! axis-aligned box whose sides may be open, and every bound is a strict
//! inequality. It has to work with no external geometry source.

use serde::{Deserialize, Serialize};

use crate::coords::LatLon;

/// An axis-aligned region with optional (unbounded) sides.
/// A point is inside when it is strictly within every bound that is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandRegion {
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
}

impl LandRegion {
    pub const fn new(
        lat_min: Option<f64>,
        lat_max: Option<f64>,
        lon_min: Option<f64>,
        lon_max: Option<f64>,
    ) -> Self {
        Self { lat_min, lat_max, lon_min, lon_max }
    }

    /// `true` when no side is set, so the region would cover every point.
    pub fn is_unbounded(&self) -> bool {
        self.lat_min.is_none()
            && self.lat_max.is_none()
            && self.lon_min.is_none()
            && self.lon_max.is_none()
    }

    pub fn contains(&self, p: LatLon) -> bool {
        self.lat_min.map_or(true, |v| p.lat > v)
            && self.lat_max.map_or(true, |v| p.lat < v)
            && self.lon_min.map_or(true, |v| p.lon > v)
            && self.lon_max.map_or(true, |v| p.lon < v)
    }
}

/// Default land table for the 33–37.5°N, 8–12°E box.
pub fn default_land_regions() -> Vec<LandRegion> {
    vec![
        // Northern coast west of Tunis.
        LandRegion::new(Some(36.5), Some(37.0), None, Some(10.3)),
        // Interior, central and northern.
        LandRegion::new(Some(34.0), Some(37.0), None, Some(9.0)),
        // South-west interior.
        LandRegion::new(None, Some(34.0), None, Some(9.5)),
        // Cap Bon.
        LandRegion::new(Some(36.0), Some(37.0), Some(10.5), Some(10.8)),
        // Djerba.
        LandRegion::new(Some(33.7), Some(33.9), Some(10.8), Some(11.1)),
        // Kerkennah.
        LandRegion::new(Some(34.6), Some(34.9), Some(11.0), Some(11.3)),
    ]
}

/// `true` if any region in the table contains the point.
pub fn is_heuristic_land(regions: &[LandRegion], p: LatLon) -> bool {
    regions.iter().any(|r| r.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_strict() {
        let r = LandRegion::new(Some(34.0), Some(37.0), None, Some(9.0));
        assert!(r.contains(LatLon::new(35.0, 8.5)));
        assert!(!r.contains(LatLon::new(34.0, 8.5)));
        assert!(!r.contains(LatLon::new(37.0, 8.5)));
        assert!(!r.contains(LatLon::new(35.0, 9.0)));
    }

    #[test]
    fn open_sides_are_unbounded() {
        let r = LandRegion::new(None, Some(34.0), None, Some(9.5));
        assert!(r.contains(LatLon::new(-80.0, -170.0)));
        assert!(!r.contains(LatLon::new(34.5, 9.0)));
    }

    #[test]
    fn default_table_known_points() {
        let t = default_land_regions();
        // Inland near Kairouan.
        assert!(is_heuristic_land(&t, LatLon::new(35.5, 8.5)));
        // Djerba.
        assert!(is_heuristic_land(&t, LatLon::new(33.8, 10.9)));
        // Open water east of Kerkennah.
        assert!(!is_heuristic_land(&t, LatLon::new(34.75, 11.6)));
        // Gulf of Hammamet.
        assert!(!is_heuristic_land(&t, LatLon::new(36.2, 10.7 + 0.2)));
    }

    #[test]
    fn empty_region_matches_everything() {
        let r = LandRegion::default();
        assert!(r.is_unbounded());
        assert!(r.contains(LatLon::new(0.0, 0.0)));
    }

    #[test]
    fn one_side_makes_a_region_bounded() {
        assert!(!LandRegion::new(None, None, None, Some(9.0)).is_unbounded());
        assert!(default_land_regions().iter().all(|r| !r.is_unbounded()));
    }

    #[test]
    fn region_deserializes_with_missing_sides() {
        let r: LandRegion = serde_json::from_str(r#"{"lat_max": 34.0, "lon_max": 9.5}"#).unwrap();
        assert_eq!(r, LandRegion::new(None, Some(34.0), None, Some(9.5)));
    }
}
