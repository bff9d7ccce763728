//! Zone classification: environmental sample → (label, confidence).
//!
//! Two implementations share the [`ZoneClassifier`] interface:
//!   - [`model::ModelClassifier`], used when a trained artifact is available.
//!   - [`rules::RuleClassifier`], the seasonal threshold fallback.
//!
//! The variant is chosen once when the [`Classifier`] is built. A model
//! failure on a single input falls back to the rules for that input only.

pub mod model;
pub mod rules;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coords::LatLon;
use crate::environment::EnvironmentalSample;
use crate::error::Result;
use model::ModelClassifier;
use rules::RuleClassifier;

/// Three-level fishing potential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneLabel {
    Low,
    Medium,
    High,
}

impl ZoneLabel {
    /// Model class index → label (0 LOW, 1 MEDIUM, 2 HIGH).
    pub fn from_class_index(idx: i64) -> Option<Self> {
        match idx {
            0 => Some(ZoneLabel::Low),
            1 => Some(ZoneLabel::Medium),
            2 => Some(ZoneLabel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZoneLabel::Low => "LOW",
            ZoneLabel::Medium => "MEDIUM",
            ZoneLabel::High => "HIGH",
        }
    }
}

impl fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label plus confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneClassification {
    pub label: ZoneLabel,
    pub confidence: f64,
}

/// A classified grid cell with the features that produced the label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(flatten)]
    pub position: LatLon,
    pub label: ZoneLabel,
    pub confidence: f64,
    pub sst: f64,
    pub chl: f64,
}

impl Zone {
    pub fn new(sample: &EnvironmentalSample, zone: ZoneClassification) -> Self {
        Self {
            position: sample.position,
            label: zone.label,
            confidence: zone.confidence,
            sst: sample.sst,
            chl: sample.chl,
        }
    }
}

/// Capability interface shared by both classifier variants.
pub trait ZoneClassifier: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Classify one sample. `month` is 1-based.
    fn classify(&self, sample: &EnvironmentalSample, month: u32) -> Result<ZoneClassification>;
}

/// Which implementation is primary for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Model,
    Rules,
}

/// Outcome of one classification, with whether the fallback was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified {
    pub zone: ZoneClassification,
    pub fell_back: bool,
}

/// Primary classifier plus the always-available rule fallback.
#[derive(Debug)]
pub struct Classifier {
    primary: Option<Box<dyn ZoneClassifier>>,
    rules: RuleClassifier,
}

impl Classifier {
    /// Rules only.
    pub fn rules() -> Self {
        Self { primary: None, rules: RuleClassifier::new() }
    }

    pub fn with_model(model: ModelClassifier) -> Self {
        Self::with_primary(Box::new(model))
    }

    /// Any primary implementation; the rules stay as per-input fallback.
    pub fn with_primary(primary: Box<dyn ZoneClassifier>) -> Self {
        Self { primary: Some(primary), rules: RuleClassifier::new() }
    }

    pub fn kind(&self) -> ClassifierKind {
        if self.primary.is_some() {
            ClassifierKind::Model
        } else {
            ClassifierKind::Rules
        }
    }

    pub fn primary_name(&self) -> &'static str {
        self.primary.as_ref().map_or(self.rules.name(), |p| p.name())
    }

    /// Never fails: a primary error is absorbed by the rules.
    pub fn classify(&self, sample: &EnvironmentalSample) -> Classified {
        let month = sample.month();
        if let Some(primary) = &self.primary {
            match primary.classify(sample, month) {
                Ok(zone) => return Classified { zone, fell_back: false },
                Err(e) => {
                    trace!(lat = sample.position.lat, lon = sample.position.lon, error = %e, "model failed, using seasonal rules");
                }
            }
            return Classified { zone: self.rules.evaluate(sample, month), fell_back: true };
        }
        Classified { zone: self.rules.evaluate(sample, month), fell_back: false }
    }
}
