//! Groups HIGH zones into contiguous areas.
//!
//! Density-based clustering with `eps = distance_km / 111` degrees and
//! `min_samples = 2`. Every input zone ends up either in exactly one area or
//! in the singleton list. Without the `clustering` feature all zones pass
//! through as singletons.

#[cfg(feature = "clustering")]
pub mod dbscan;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::Zone;
use crate::coords::{BoundingBox, LatLon};

/// Default linkage distance between HIGH zones.
pub const DEFAULT_CLUSTER_DISTANCE_KM: f64 = 12.0;
/// Minimum neighbourhood size (including the point) for a core point.
pub const MIN_SAMPLES: usize = 2;
/// Margin added around member extremes when building an area polygon.
pub const POLYGON_MARGIN_DEG: f64 = 0.01;

/// `true` when this build can cluster.
pub fn clustering_available() -> bool {
    cfg!(feature = "clustering")
}

/// A cluster of at least two adjacent HIGH zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zones: Vec<Zone>,
    pub count: usize,
    pub avg_confidence: f64,
    /// Closed ring in (lat, lon): SW, SE, NE, NW, SW.
    pub polygon: Vec<LatLon>,
}

impl Area {
    /// Build from member zones. Returns `None` for fewer than two members.
    pub fn from_members(zones: Vec<Zone>) -> Option<Self> {
        if zones.len() < MIN_SAMPLES {
            return None;
        }
        let n = zones.len() as f64;
        let center_lat = zones.iter().map(|z| z.position.lat).sum::<f64>() / n;
        let center_lon = zones.iter().map(|z| z.position.lon).sum::<f64>() / n;
        let avg_confidence = zones.iter().map(|z| z.confidence).sum::<f64>() / n;

        let fold = |f: fn(&LatLon) -> f64, init: f64, pick: fn(f64, f64) -> f64| {
            zones.iter().map(|z| f(&z.position)).fold(init, pick)
        };
        let min_lat = fold(|p| p.lat, f64::INFINITY, f64::min) - POLYGON_MARGIN_DEG;
        let max_lat = fold(|p| p.lat, f64::NEG_INFINITY, f64::max) + POLYGON_MARGIN_DEG;
        let min_lon = fold(|p| p.lon, f64::INFINITY, f64::min) - POLYGON_MARGIN_DEG;
        let max_lon = fold(|p| p.lon, f64::NEG_INFINITY, f64::max) + POLYGON_MARGIN_DEG;

        let polygon = vec![
            LatLon::new(min_lat, min_lon),
            LatLon::new(min_lat, max_lon),
            LatLon::new(max_lat, max_lon),
            LatLon::new(max_lat, min_lon),
            LatLon::new(min_lat, min_lon),
        ];

        Some(Self {
            center_lat,
            center_lon,
            count: zones.len(),
            zones,
            avg_confidence,
            polygon,
        })
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(self.center_lat, self.center_lon)
    }

    /// Axis-aligned extent of the polygon.
    pub fn bounds(&self) -> BoundingBox {
        let lats = self.polygon.iter().map(|p| p.lat);
        let lons = self.polygon.iter().map(|p| p.lon);
        BoundingBox::new(
            lats.clone().fold(f64::INFINITY, f64::min),
            lats.fold(f64::NEG_INFINITY, f64::max),
            lons.clone().fold(f64::INFINITY, f64::min),
            lons.fold(f64::NEG_INFINITY, f64::max),
        )
    }
}

/// Areas plus the HIGH zones no area absorbed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    pub areas: Vec<Area>,
    pub singletons: Vec<Zone>,
}

impl Clustering {
    /// Total zones across areas and singletons.
    pub fn zone_count(&self) -> usize {
        self.areas.iter().map(|a| a.count).sum::<usize>() + self.singletons.len()
    }

    fn passthrough(zones: Vec<Zone>) -> Self {
        Self { areas: Vec::new(), singletons: zones }
    }
}

/// Partition HIGH zones into areas and singletons. Never fails.
pub fn cluster_high_zones(zones: Vec<Zone>, distance_km: f64) -> Clustering {
    if zones.is_empty() || !clustering_available() {
        return Clustering::passthrough(zones);
    }
    run_clustering(zones, distance_km)
}

#[cfg(feature = "clustering")]
fn run_clustering(zones: Vec<Zone>, distance_km: f64) -> Clustering {
    let eps = crate::coords::km_to_degrees(distance_km);
    let points: Vec<LatLon> = zones.iter().map(|z| z.position).collect();
    let labels = dbscan::dbscan(&points, eps, MIN_SAMPLES);

    let n_clusters = labels.iter().flatten().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<Zone>> = vec![Vec::new(); n_clusters];
    let mut singletons = Vec::new();
    for (zone, label) in zones.into_iter().zip(labels) {
        match label {
            Some(c) => members[c].push(zone),
            None => singletons.push(zone),
        }
    }

    // Every cluster grows from a core point, so it has at least `MIN_SAMPLES` members.
    debug_assert!(members.iter().all(|g| g.len() >= MIN_SAMPLES));
    let areas: Vec<Area> = members.into_iter().filter_map(Area::from_members).collect();
    debug!(eps, areas = areas.len(), singletons = singletons.len(), "clustered HIGH zones");
    Clustering { areas, singletons }
}

#[cfg(not(feature = "clustering"))]
fn run_clustering(zones: Vec<Zone>, _distance_km: f64) -> Clustering {
    debug!("clustering unavailable in this build, passing zones through");
    Clustering::passthrough(zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ZoneLabel;

    fn zone(lat: f64, lon: f64, confidence: f64) -> Zone {
        Zone {
            position: LatLon::new(lat, lon),
            label: ZoneLabel::High,
            confidence,
            sst: 26.0,
            chl: 0.3,
        }
    }

    fn scattered() -> Vec<Zone> {
        vec![
            zone(35.00, 11.00, 0.8),
            zone(35.05, 11.00, 0.9),
            zone(35.05, 11.05, 0.7),
            zone(36.50, 11.80, 0.75),
            zone(34.00, 10.50, 0.95),
            zone(34.05, 10.50, 0.85),
        ]
    }

    fn assert_partition(input: &[Zone], out: &Clustering) {
        assert_eq!(out.zone_count(), input.len(), "no omission or duplication");
        for z in input {
            let in_areas = out.areas.iter().filter(|a| a.zones.contains(z)).count();
            let in_singles = out.singletons.iter().filter(|s| *s == z).count();
            assert_eq!(in_areas + in_singles, 1, "zone {z:?} must appear exactly once");
        }
        for a in &out.areas {
            assert!(a.count >= 2);
            assert_eq!(a.count, a.zones.len());
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = cluster_high_zones(Vec::new(), DEFAULT_CLUSTER_DISTANCE_KM);
        assert!(out.areas.is_empty());
        assert!(out.singletons.is_empty());
    }

    #[cfg(feature = "clustering")]
    #[test]
    fn default_distance_groups_neighbours() {
        let input = scattered();
        let out = cluster_high_zones(input.clone(), DEFAULT_CLUSTER_DISTANCE_KM);
        assert_partition(&input, &out);
        assert_eq!(out.areas.len(), 2);
        assert_eq!(out.areas[0].count, 3);
        assert_eq!(out.areas[1].count, 2);
        assert_eq!(out.singletons, vec![zone(36.50, 11.80, 0.75)]);
    }

    #[cfg(feature = "clustering")]
    #[test]
    fn tiny_eps_makes_everything_singleton() {
        let input = scattered();
        let out = cluster_high_zones(input.clone(), 1e-9);
        assert_partition(&input, &out);
        assert!(out.areas.is_empty());
        assert_eq!(out.singletons, input);
    }

    #[cfg(feature = "clustering")]
    #[test]
    fn huge_eps_makes_one_area() {
        let input = scattered();
        let out = cluster_high_zones(input.clone(), 1e9);
        assert_partition(&input, &out);
        assert_eq!(out.areas.len(), 1);
        assert!(out.singletons.is_empty());
    }

    #[cfg(feature = "clustering")]
    #[test]
    fn area_statistics_and_polygon() {
        let input = vec![zone(35.0, 11.0, 0.8), zone(35.1, 11.1, 0.9)];
        let out = cluster_high_zones(input, 20.0);
        assert_eq!(out.areas.len(), 1);
        let a = &out.areas[0];
        assert!((a.center_lat - 35.05).abs() < 1e-12);
        assert!((a.center_lon - 11.05).abs() < 1e-12);
        assert!((a.avg_confidence - 0.85).abs() < 1e-12);
        assert_eq!(a.polygon.len(), 5);
        assert_eq!(a.polygon.first(), a.polygon.last());
        assert!((a.polygon[0].lat - 34.99).abs() < 1e-12);
        assert!((a.polygon[2].lon - 11.11).abs() < 1e-12);
    }

    #[cfg(feature = "clustering")]
    #[test]
    fn polygon_inset_by_margin_still_contains_members() {
        let out = cluster_high_zones(scattered(), DEFAULT_CLUSTER_DISTANCE_KM);
        for a in &out.areas {
            let b = a.bounds();
            let inset = BoundingBox::new(
                b.lat_min + POLYGON_MARGIN_DEG - 1e-9,
                b.lat_max - POLYGON_MARGIN_DEG + 1e-9,
                b.lon_min + POLYGON_MARGIN_DEG - 1e-9,
                b.lon_max - POLYGON_MARGIN_DEG + 1e-9,
            );
            for z in &a.zones {
                assert!(inset.contains(z.position), "{:?} outside {inset:?}", z.position);
            }
        }
    }

    #[test]
    fn passthrough_keeps_every_zone_in_order() {
        let input = scattered();
        let out = Clustering::passthrough(input.clone());
        assert_partition(&input, &out);
        assert!(out.areas.is_empty());
        assert_eq!(out.singletons, input);
    }

    #[cfg(not(feature = "clustering"))]
    #[test]
    fn without_clustering_zones_pass_through() {
        assert!(!clustering_available());
        let input = scattered();
        let out = cluster_high_zones(input.clone(), DEFAULT_CLUSTER_DISTANCE_KM);
        assert!(out.areas.is_empty());
        assert_eq!(out.singletons, input);
    }

    #[test]
    fn single_zone_is_a_singleton() {
        let out = cluster_high_zones(vec![zone(35.0, 11.0, 0.8)], DEFAULT_CLUSTER_DISTANCE_KM);
        assert!(out.areas.is_empty());
        assert_eq!(out.singletons.len(), 1);
    }

    #[test]
    fn area_requires_two_members() {
        assert!(Area::from_members(vec![zone(35.0, 11.0, 0.8)]).is_none());
        assert!(Area::from_members(Vec::new()).is_none());
    }
}
