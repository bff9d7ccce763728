//! Pipeline configuration.
//! Defaults match the Gulf of Gabès / Tunisian coast deployment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cluster::DEFAULT_CLUSTER_DISTANCE_KM;
use crate::coords::BoundingBox;
use crate::environment::seasonal::MonthlyRanges;
use crate::error::{PfzError, Result};
use crate::grid::grid_dims;
use crate::land::heuristic::{default_land_regions, LandRegion};

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_LAT_MIN: f64 = 33.0;
pub const DEFAULT_LAT_MAX: f64 = 37.5;
pub const DEFAULT_LON_MIN: f64 = 8.0;
pub const DEFAULT_LON_MAX: f64 = 12.0;
/// Grid spacing in degrees.
pub const DEFAULT_RESOLUTION: f64 = 0.05;

pub const DEFAULT_MODEL_PATH: &str = "models/random_forest.json";
pub const DEFAULT_SCALER_PATH: &str = "models/scaler.json";
pub const DEFAULT_LAND_POLYGONS_PATH: &str = "data/coastline.geojson";

// ── Structs ───────────────────────────────────────────────────────────────────

/// Locations of the optional inputs. `None` disables the resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePaths {
    pub model: Option<PathBuf>,
    pub scaler: Option<PathBuf>,
    pub land_polygons: Option<PathBuf>,
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self {
            model: Some(PathBuf::from(DEFAULT_MODEL_PATH)),
            scaler: Some(PathBuf::from(DEFAULT_SCALER_PATH)),
            land_polygons: Some(PathBuf::from(DEFAULT_LAND_POLYGONS_PATH)),
        }
    }
}

impl ResourcePaths {
    /// No optional resources at all.
    pub fn none() -> Self {
        Self { model: None, scaler: None, land_polygons: None }
    }
}

/// Everything one prediction run depends on, apart from the date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub bbox: BoundingBox,
    /// Degrees between grid nodes, > 0.
    pub resolution: f64,
    /// DBSCAN linkage distance for HIGH zones, > 0.
    pub cluster_distance_km: f64,
    pub sst_ranges: MonthlyRanges,
    pub chl_ranges: MonthlyRanges,
    pub land_regions: Vec<LandRegion>,
    pub resources: ResourcePaths,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bbox: BoundingBox::new(DEFAULT_LAT_MIN, DEFAULT_LAT_MAX, DEFAULT_LON_MIN, DEFAULT_LON_MAX),
            resolution: DEFAULT_RESOLUTION,
            cluster_distance_km: DEFAULT_CLUSTER_DISTANCE_KM,
            sst_ranges: MonthlyRanges::default_sst(),
            chl_ranges: MonthlyRanges::default_chl(),
            land_regions: default_land_regions(),
            resources: ResourcePaths::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config; absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PfzError::invalid(format!("config: {e}")))
    }

    /// Check grid, clustering, land table and climatology parameters.
    pub fn validate(&self) -> Result<()> {
        grid_dims(&self.bbox, self.resolution)?;
        if !self.cluster_distance_km.is_finite() || self.cluster_distance_km <= 0.0 {
            return Err(PfzError::invalid(format!(
                "cluster distance must be a positive number of km, got {}",
                self.cluster_distance_km
            )));
        }
        if let Some(i) = self.land_regions.iter().position(LandRegion::is_unbounded) {
            return Err(PfzError::invalid(format!(
                "land region {i} has no bounds and would mask the whole grid"
            )));
        }
        self.sst_ranges.validate("sst")?;
        self.chl_ranges.validate("chl")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let c = PipelineConfig::default();
        c.validate().expect("defaults must validate");
        assert_eq!(c.bbox.lat_min, 33.0);
        assert_eq!(c.bbox.lon_max, 12.0);
        assert_eq!(c.resolution, 0.05);
        assert_eq!(c.cluster_distance_km, 12.0);
        assert_eq!(c.land_regions.len(), default_land_regions().len());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = PipelineConfig::from_json_str(r#"{"resolution": 0.1, "resources": {"model": null}}"#)
            .unwrap();
        assert_eq!(c.resolution, 0.1);
        assert_eq!(c.cluster_distance_km, DEFAULT_CLUSTER_DISTANCE_KM);
        assert_eq!(c.resources.model, None);
        assert_eq!(c.resources.scaler, Some(PathBuf::from(DEFAULT_SCALER_PATH)));
    }

    #[test]
    fn dumped_defaults_reload() {
        let text = serde_json::to_string_pretty(&PipelineConfig::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["sst_ranges"].as_array().map(Vec::len), Some(12));
        assert_eq!(v["resources"]["model"], DEFAULT_MODEL_PATH);
        let c = PipelineConfig::from_json_str(&text).unwrap();
        c.validate().unwrap();
        assert_eq!(c.resources, ResourcePaths::default());
    }

    #[test]
    fn bad_values_are_invalid_configuration() {
        let bad_res = PipelineConfig { resolution: 0.0, ..Default::default() };
        assert!(bad_res.validate().unwrap_err().is_fatal());

        let bad_dist = PipelineConfig { cluster_distance_km: -1.0, ..Default::default() };
        assert!(bad_dist.validate().unwrap_err().is_fatal());

        let mut flipped = PipelineConfig::default();
        flipped.bbox = BoundingBox::new(37.5, 33.0, 8.0, 12.0);
        assert!(flipped.validate().unwrap_err().is_fatal());

        let mut ranges = PipelineConfig::default();
        ranges.sst_ranges.0[3].min = f64::NAN;
        assert!(ranges.validate().unwrap_err().is_fatal());
    }

    #[test]
    fn boundless_land_region_is_rejected() {
        let c = PipelineConfig::from_json_str(r#"{"land_regions": [{}]}"#).unwrap();
        assert_eq!(c.land_regions, vec![LandRegion::default()]);
        let err = c.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("land region 0"), "{err}");

        let mut mixed = PipelineConfig::default();
        mixed.land_regions.push(LandRegion::default());
        assert!(mixed.validate().unwrap_err().is_fatal());

        let none = PipelineConfig { land_regions: Vec::new(), ..Default::default() };
        none.validate().unwrap();
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = PipelineConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"cluster_distance_km": 5.0}}"#).unwrap();
        let c = PipelineConfig::from_json_file(f.path()).unwrap();
        assert_eq!(c.cluster_distance_km, 5.0);
    }
}
