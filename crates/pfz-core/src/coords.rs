//! Geographic coordinate types and bounding-box addressing.
//! All coordinate math uses f64 for precision.

use serde::{Deserialize, Serialize};

/// Approximate length of one degree of latitude in kilometres.
pub const KM_PER_DEGREE: f64 = 111.0;

/// A point in geographic coordinates (WGS84 degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Planar distance in degrees, treating (lat, lon) as Euclidean axes.
    /// Good enough at the regional scale the clustering works on.
    pub fn degree_distance(self, other: LatLon) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

/// Convert a kilometre distance to degrees using the fixed 1° ≈ 111 km factor.
pub fn km_to_degrees(km: f64) -> f64 {
    km / KM_PER_DEGREE
}

/// Axis-aligned geographic bounding box. Containment is inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self { lat_min, lat_max, lon_min, lon_max }
    }

    pub fn contains(&self, p: LatLon) -> bool {
        (self.lat_min..=self.lat_max).contains(&p.lat)
            && (self.lon_min..=self.lon_max).contains(&p.lon)
    }

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// South-west corner, the reference point for the coastal-proximity proxy.
    pub fn south_west(&self) -> LatLon {
        LatLon::new(self.lat_min, self.lon_min)
    }

    pub fn is_finite(&self) -> bool {
        [self.lat_min, self.lat_max, self.lon_min, self.lon_max]
            .iter()
            .all(|v| v.is_finite())
    }
}
