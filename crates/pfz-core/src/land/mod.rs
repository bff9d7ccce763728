//! Land/water masking of grid cells.
//!
//! Layers, evaluated in order with short-circuit:
//!   1. Bounding-box containment: outside the box is never water.
//!   2. Heuristic land rectangles: any match is land.
//!   3. Authoritative polygons (optional): inside any polygon is land.
//!
//! A failed polygon lookup keeps the heuristic answer for that point.

pub mod heuristic;
pub mod polygons;

use tracing::warn;

use crate::coords::{BoundingBox, LatLon};
use heuristic::{is_heuristic_land, LandRegion};
use polygons::LandGeometry;

/// Result of a single land/water test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterTest {
    pub water: bool,
    /// The polygon layer was consulted and failed; the answer is heuristic-only.
    pub geometry_degraded: bool,
}

/// Layered land/water classifier.
#[derive(Debug)]
pub struct LandWaterClassifier {
    bbox: BoundingBox,
    regions: Vec<LandRegion>,
    geometry: Option<Box<dyn LandGeometry>>,
}

impl LandWaterClassifier {
    pub fn new(
        bbox: BoundingBox,
        regions: Vec<LandRegion>,
        geometry: Option<Box<dyn LandGeometry>>,
    ) -> Self {
        Self { bbox, regions, geometry }
    }

    /// Heuristic-only classifier.
    pub fn heuristic(bbox: BoundingBox, regions: Vec<LandRegion>) -> Self {
        Self::new(bbox, regions, None)
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn geometry_description(&self) -> Option<String> {
        self.geometry.as_ref().map(|g| g.describe())
    }

    /// Full test with degradation flag.
    pub fn test(&self, p: LatLon) -> WaterTest {
        if !self.bbox.contains(p) {
            return WaterTest { water: false, geometry_degraded: false };
        }
        if is_heuristic_land(&self.regions, p) {
            return WaterTest { water: false, geometry_degraded: false };
        }
        match &self.geometry {
            None => WaterTest { water: true, geometry_degraded: false },
            Some(g) => match g.contains(p) {
                Ok(inside) => WaterTest { water: !inside, geometry_degraded: false },
                Err(e) => {
                    warn!(lat = p.lat, lon = p.lon, error = %e, "land polygon lookup failed, using heuristic");
                    WaterTest { water: true, geometry_degraded: true }
                }
            },
        }
    }

    pub fn is_water(&self, p: LatLon) -> bool {
        self.test(p).water
    }
}
