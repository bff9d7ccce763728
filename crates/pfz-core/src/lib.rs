//! Potential fishing zone prediction.
//!
//! For a date, lays a lattice over the region, keeps the water cells,
//! synthesizes sea-surface temperature and chlorophyll for each, labels them
//! LOW/MEDIUM/HIGH and groups adjacent HIGH cells into areas.

pub mod classify;
pub mod cluster;
pub mod config;
pub mod coords;
pub mod environment;
pub mod error;
pub mod export;
pub mod grid;
pub mod land;
pub mod pipeline;

pub use classify::{Zone, ZoneLabel};
pub use cluster::{Area, Clustering};
pub use config::{PipelineConfig, ResourcePaths};
pub use coords::{BoundingBox, LatLon};
pub use error::{PfzError, Result};
pub use pipeline::{Capabilities, OptionalResources, PfzPredictor, PredictionResult, RunDiagnostics};
