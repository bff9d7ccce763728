//! Pipeline orchestrator: grid → water mask → synthesis → classification →
//! clustering, for one date.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::NaiveDate;
#[cfg(feature = "threading")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classify::model::{FeatureScaler, ModelArtifact, ModelClassifier};
use crate::classify::{Classifier, ClassifierKind, Zone, ZoneLabel};
use crate::cluster::{cluster_high_zones, clustering_available, Area};
use crate::config::{PipelineConfig, ResourcePaths};
use crate::coords::LatLon;
use crate::environment::FeatureSynthesizer;
use crate::error::Result;
use crate::grid::generate_grid;
use crate::land::polygons::{LandGeometry, PolygonSet};
use crate::land::LandWaterClassifier;

/// A `debug!` progress event is emitted every this many evaluated cells.
pub const PROGRESS_EVERY: usize = 100;

// ── Optional inputs ───────────────────────────────────────────────────────────

/// Optional data resolved once before any run. Each slot is independent.
#[derive(Debug, Default)]
pub struct OptionalResources {
    pub model: Option<ModelArtifact>,
    pub scaler: Option<FeatureScaler>,
    pub land_geometry: Option<Box<dyn LandGeometry>>,
}

impl OptionalResources {
    /// Nothing optional: seasonal rules and heuristic land only.
    pub fn none() -> Self {
        Self::default()
    }

    /// Load whatever the paths point at. Never fails: a missing file is
    /// logged at `info`, an unusable one at `warn`, and the slot stays empty.
    pub fn load(paths: &ResourcePaths) -> Self {
        Self {
            model: load_optional("model", paths.model.as_deref(), ModelArtifact::load),
            scaler: load_optional("scaler", paths.scaler.as_deref(), FeatureScaler::load),
            land_geometry: load_optional("land polygons", paths.land_polygons.as_deref(), |p| {
                PolygonSet::load(p).map(|s| Box::new(s) as Box<dyn LandGeometry>)
            }),
        }
    }
}

fn load_optional<T>(
    resource: &str,
    path: Option<&Path>,
    loader: impl FnOnce(&Path) -> Result<T>,
) -> Option<T> {
    let path = path?;
    if !path.exists() {
        info!(resource, path = %path.display(), "optional resource not found, continuing without it");
        return None;
    }
    match loader(path) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(resource, path = %path.display(), error = %e, "optional resource unusable, continuing without it");
            None
        }
    }
}

/// Which optional capabilities are active for this predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub model: bool,
    pub scaler: bool,
    pub land_geometry: bool,
    pub clustering: bool,
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Counters and capability flags for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub candidate_cells: usize,
    pub water_cells: usize,
    pub high_cells: usize,
    pub medium_cells: usize,
    pub low_cells: usize,
    pub classifier: ClassifierKind,
    /// Cells where the model failed and the seasonal rules answered.
    pub model_fallbacks: usize,
    /// Cells where the polygon lookup failed and the heuristic answered.
    pub geometry_failures: usize,
    pub capabilities: Capabilities,
    pub elapsed_ms: u64,
}

/// Output of one prediction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub date: NaiveDate,
    pub areas: Vec<Area>,
    pub singletons: Vec<Zone>,
    pub high_zone_count: usize,
    pub water_cell_count: usize,
    pub diagnostics: RunDiagnostics,
}

/// Per-cell outcome before the clustering barrier.
struct CellOutcome {
    geometry_degraded: bool,
    /// `None` for land cells.
    zone: Option<Zone>,
    fell_back: bool,
}

// ── Predictor ─────────────────────────────────────────────────────────────────

/// Ready-to-run pipeline for one configuration.
#[derive(Debug)]
pub struct PfzPredictor {
    config: PipelineConfig,
    land: LandWaterClassifier,
    synthesizer: FeatureSynthesizer,
    classifier: Classifier,
    capabilities: Capabilities,
}

impl PfzPredictor {
    /// Validate `config` and assemble the stages around `resources`.
    pub fn new(config: PipelineConfig, resources: OptionalResources) -> Result<Self> {
        config.validate()?;

        let OptionalResources { model, scaler, land_geometry } = resources;
        let scaler = match (&model, scaler) {
            (None, Some(_)) => {
                debug!("scaler supplied without a model, ignoring it");
                None
            }
            (_, s) => s,
        };
        let capabilities = Capabilities {
            model: model.is_some(),
            scaler: scaler.is_some(),
            land_geometry: land_geometry.is_some(),
            clustering: clustering_available(),
        };

        let classifier = match model {
            Some(m) => {
                info!(kind = m.kind(), scaled = scaler.is_some(), "using trained zone classifier");
                Classifier::with_model(ModelClassifier::new(m, scaler))
            }
            None => {
                info!("no model artifact, using seasonal rules");
                Classifier::rules()
            }
        };
        let land = LandWaterClassifier::new(config.bbox, config.land_regions.clone(), land_geometry);
        if let Some(desc) = land.geometry_description() {
            info!(geometry = %desc, "land polygons active");
        }
        if !capabilities.clustering {
            warn!("clustering unavailable in this build, HIGH zones will be reported individually");
        }
        let synthesizer = FeatureSynthesizer::new(
            config.bbox,
            config.sst_ranges.clone(),
            config.chl_ranges.clone(),
        );

        Ok(Self { config, land, synthesizer, classifier, capabilities })
    }

    /// Validate `config` and load its optional resources from disk.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        // Fail on bad parameters before touching the filesystem.
        config.validate()?;
        let resources = OptionalResources::load(&config.resources);
        Self::new(config, resources)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Run the full pipeline for `date`.
    ///
    /// Only an invalid configuration can fail here; optional-data problems
    /// degrade per cell.
    pub fn predict(&self, date: NaiveDate) -> Result<PredictionResult> {
        let start = Instant::now();
        let grid = generate_grid(&self.config.bbox, self.config.resolution)?;
        let total = grid.len();
        info!(%date, cells = total, classifier = self.classifier.primary_name(), "predicting fishing zones");

        let evaluated = AtomicUsize::new(0);
        let eval = |p: &LatLon| {
            let out = self.evaluate_cell(date, *p);
            let n = evaluated.fetch_add(1, Ordering::Relaxed) + 1;
            if n % PROGRESS_EVERY == 0 {
                debug!(evaluated = n, total, "cell progress");
            }
            out
        };

        #[cfg(feature = "threading")]
        let outcomes: Vec<CellOutcome> = grid.par_iter().map(eval).collect();
        #[cfg(not(feature = "threading"))]
        let outcomes: Vec<CellOutcome> = grid.iter().map(eval).collect();

        // ── Barrier: tally in grid order ──────────────────────────────────────
        let mut water_cells = 0;
        let (mut high, mut medium, mut low) = (0, 0, 0);
        let mut model_fallbacks = 0;
        let mut geometry_failures = 0;
        let mut high_zones = Vec::new();
        for o in outcomes {
            if o.geometry_degraded {
                geometry_failures += 1;
            }
            let Some(zone) = o.zone else { continue };
            water_cells += 1;
            if o.fell_back {
                model_fallbacks += 1;
            }
            match zone.label {
                ZoneLabel::High => {
                    high += 1;
                    high_zones.push(zone);
                }
                ZoneLabel::Medium => medium += 1,
                ZoneLabel::Low => low += 1,
            }
        }
        if model_fallbacks > 0 {
            warn!(cells = model_fallbacks, "model failed on some cells, seasonal rules used there");
        }
        if geometry_failures > 0 {
            warn!(cells = geometry_failures, "land polygon lookups failed, heuristic used there");
        }

        let clustering = cluster_high_zones(high_zones, self.config.cluster_distance_km);
        debug_assert_eq!(clustering.zone_count(), high);

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            %date,
            water = water_cells,
            high,
            medium,
            low,
            areas = clustering.areas.len(),
            singletons = clustering.singletons.len(),
            elapsed_ms,
            "prediction complete"
        );

        Ok(PredictionResult {
            date,
            areas: clustering.areas,
            singletons: clustering.singletons,
            high_zone_count: high,
            water_cell_count: water_cells,
            diagnostics: RunDiagnostics {
                candidate_cells: total,
                water_cells,
                high_cells: high,
                medium_cells: medium,
                low_cells: low,
                classifier: self.classifier.kind(),
                model_fallbacks,
                geometry_failures,
                capabilities: self.capabilities,
                elapsed_ms,
            },
        })
    }

    fn evaluate_cell(&self, date: NaiveDate, p: LatLon) -> CellOutcome {
        let test = self.land.test(p);
        if !test.water {
            return CellOutcome { geometry_degraded: test.geometry_degraded, zone: None, fell_back: false };
        }
        let sample = self.synthesizer.sample(date, p);
        let classified = self.classifier.classify(&sample);
        CellOutcome {
            geometry_degraded: test.geometry_degraded,
            zone: Some(Zone::new(&sample, classified.zone)),
            fell_back: classified.fell_back,
        }
    }
}
