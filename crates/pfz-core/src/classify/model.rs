//! Trained model artifacts and the model-backed classifier.
//!
//! Artifacts are JSON documents tagged by `kind`:
//!   - `random_forest`: binary decision trees in array form. A split sends
//!     `x[feature] <= threshold` to `left`. Leaves hold per-class weights;
//!     forest probabilities are the mean of each tree's normalized leaf.
//!   - `nearest_centroid`: hard labels only, no probabilities.
//!
//! The feature vector is `[sst, chl]`. Class indices 0/1/2 are LOW/MEDIUM/HIGH.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ZoneClassification, ZoneClassifier, ZoneLabel};
use crate::environment::EnvironmentalSample;
use crate::error::{PfzError, Result};

/// Confidence reported when the model only yields a hard label.
pub const HARD_LABEL_CONFIDENCE: f64 = 0.8;

/// Number of features the pipeline feeds to a model.
pub const N_FEATURES: usize = 2;

/// One node of a decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node 0 is the root.
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk to a leaf and return its normalized class weights.
    pub fn leaf_probabilities(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut idx = 0usize;
        // A valid tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(idx).ok_or_else(|| {
                PfzError::ClassifierRuntime(format!("tree node {idx} out of range"))
            })?;
            match node {
                TreeNode::Split { feature, threshold, left, right } => {
                    let v = x.get(*feature).ok_or_else(|| {
                        PfzError::ClassifierRuntime(format!(
                            "split on feature {feature} but input has {} features",
                            x.len()
                        ))
                    })?;
                    idx = if *v <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return normalize(value),
            }
        }
        Err(PfzError::ClassifierRuntime("decision tree contains a cycle".into()))
    }
}

fn normalize(weights: &[f64]) -> Result<Vec<f64>> {
    let total: f64 = weights.iter().sum();
    if weights.is_empty() || !total.is_finite() || total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
        return Err(PfzError::ClassifierRuntime(format!(
            "leaf weights {weights:?} are not a valid distribution"
        )));
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Mean class probabilities over all trees.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut acc: Option<Vec<f64>> = None;
        for tree in &self.trees {
            let p = tree.leaf_probabilities(x)?;
            match acc.as_mut() {
                None => acc = Some(p),
                Some(sum) if sum.len() == p.len() => {
                    sum.iter_mut().zip(&p).for_each(|(s, v)| *s += v);
                }
                Some(sum) => {
                    return Err(PfzError::ClassifierRuntime(format!(
                        "trees disagree on class count ({} vs {})",
                        sum.len(),
                        p.len()
                    )))
                }
            }
        }
        let mut probs = acc.ok_or_else(|| PfzError::ClassifierRuntime("forest has no trees".into()))?;
        let n = self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p /= n);
        Ok(probs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub n_features: usize,
    pub centroids: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
}

impl NearestCentroid {
    pub fn predict(&self, x: &[f64]) -> Result<i64> {
        if self.centroids.len() != self.labels.len() {
            return Err(PfzError::ClassifierRuntime(format!(
                "{} centroids but {} labels",
                self.centroids.len(),
                self.labels.len()
            )));
        }
        let mut best: Option<(f64, i64)> = None;
        for (c, &label) in self.centroids.iter().zip(&self.labels) {
            if c.len() != x.len() {
                return Err(PfzError::ClassifierRuntime(format!(
                    "centroid has {} features, input has {}",
                    c.len(),
                    x.len()
                )));
            }
            let d2: f64 = c.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum();
            if best.map_or(true, |(bd, _)| d2 < bd) {
                best = Some((d2, label));
            }
        }
        best.map(|(_, l)| l)
            .ok_or_else(|| PfzError::ClassifierRuntime("model has no centroids".into()))
    }
}

/// What a model returns for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Probabilities(Vec<f64>),
    Label(i64),
}

/// A persisted classifier artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest(RandomForest),
    NearestCentroid(NearestCentroid),
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PfzError::unavailable("model", format!("{}: {e}", path.display())))?;
        let model: Self = serde_json::from_str(&text)
            .map_err(|e| PfzError::unavailable("model", format!("{}: {e}", path.display())))?;
        model.check()?;
        debug!(path = %path.display(), kind = model.kind(), "loaded model artifact");
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::RandomForest(_) => "random_forest",
            ModelArtifact::NearestCentroid(_) => "nearest_centroid",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            ModelArtifact::RandomForest(f) => f.n_features,
            ModelArtifact::NearestCentroid(c) => c.n_features,
        }
    }

    /// Structural checks done once at load time. Anything subtler surfaces
    /// per input as a `ClassifierRuntime` error.
    pub fn check(&self) -> Result<()> {
        let empty = match self {
            ModelArtifact::RandomForest(f) => f.trees.is_empty(),
            ModelArtifact::NearestCentroid(c) => c.centroids.is_empty(),
        };
        if empty {
            return Err(PfzError::unavailable("model", format!("{} artifact is empty", self.kind())));
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> Result<Prediction> {
        if x.len() != self.n_features() {
            return Err(PfzError::ClassifierRuntime(format!(
                "model expects {} features, got {}",
                self.n_features(),
                x.len()
            )));
        }
        match self {
            ModelArtifact::RandomForest(f) => f.predict_proba(x).map(Prediction::Probabilities),
            ModelArtifact::NearestCentroid(c) => c.predict(x).map(Prediction::Label),
        }
    }
}

/// Persisted standardization transform: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PfzError::unavailable("scaler", format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| PfzError::unavailable("scaler", format!("{}: {e}", path.display())))
    }

    pub fn transform(&self, x: &[f64]) -> Result<Vec<f64>> {
        if self.mean.len() != x.len() || self.scale.len() != x.len() {
            return Err(PfzError::ClassifierRuntime(format!(
                "scaler fitted on {} features, got {}",
                self.mean.len(),
                x.len()
            )));
        }
        Ok(x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            // Zero-variance features are left unscaled.
            .map(|(v, (m, s))| if *s == 0.0 { v - m } else { (v - m) / s })
            .collect())
    }
}

/// Classifier backed by a trained artifact.
#[derive(Debug, Clone)]
pub struct ModelClassifier {
    model: ModelArtifact,
    scaler: Option<FeatureScaler>,
}

impl ModelClassifier {
    pub fn new(model: ModelArtifact, scaler: Option<FeatureScaler>) -> Self {
        Self { model, scaler }
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    fn features(&self, sample: &EnvironmentalSample) -> Result<Vec<f64>> {
        let raw: [f64; N_FEATURES] = [sample.sst, sample.chl];
        match &self.scaler {
            Some(s) => s.transform(&raw),
            None => Ok(raw.to_vec()),
        }
    }
}

impl ZoneClassifier for ModelClassifier {
    fn name(&self) -> &'static str {
        "model"
    }

    fn classify(&self, sample: &EnvironmentalSample, _month: u32) -> Result<ZoneClassification> {
        let x = self.features(sample)?;
        match self.model.predict(&x)? {
            Prediction::Probabilities(probs) => {
                let (class, p) = argmax(&probs)?;
                let label = ZoneLabel::from_class_index(class as i64).ok_or_else(|| {
                    PfzError::ClassifierRuntime(format!("no zone label for class index {class}"))
                })?;
                Ok(ZoneClassification { label, confidence: p })
            }
            Prediction::Label(l) => Ok(ZoneClassification {
                label: ZoneLabel::from_class_index(l).unwrap_or(ZoneLabel::Medium),
                confidence: HARD_LABEL_CONFIDENCE,
            }),
        }
    }
}

/// Index and value of the first maximum.
fn argmax(probs: &[f64]) -> Result<(usize, f64)> {
    if probs.iter().any(|p| !p.is_finite()) {
        return Err(PfzError::ClassifierRuntime(format!("non-finite probabilities {probs:?}")));
    }
    probs
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
        .ok_or_else(|| PfzError::ClassifierRuntime("empty probability vector".into()))
}
