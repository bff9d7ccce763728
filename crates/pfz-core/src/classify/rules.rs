//! Rule-based seasonal zone classifier.
//!
//! HIGH is checked first, then MEDIUM, otherwise LOW. SST intervals are open.
//!
//! | Season   | HIGH: chl > / sst    | MEDIUM: chl > / sst  |
//! |----------|----------------------|----------------------|
//! | Summer   | 0.20 / (24.0, 29.0)  | 0.10 / (22.0, 30.0)  |
//! | Winter   | 0.40 / > 16.0        | 0.25 / > 15.0        |
//! | Shoulder | 0.30 / (18.0, 26.0)  | 0.15 / (16.0, 28.0)  |

use rand::Rng;

use super::{ZoneClassification, ZoneClassifier, ZoneLabel};
use crate::environment::seasonal::Season;
use crate::environment::seed::{cell_rng, JITTER_SALT};
use crate::environment::EnvironmentalSample;
use crate::error::Result;

pub const HIGH_BASE_CONFIDENCE: f64 = 0.7;
pub const HIGH_JITTER: f64 = 0.3;
pub const MEDIUM_BASE_CONFIDENCE: f64 = 0.6;
pub const MEDIUM_JITTER: f64 = 0.2;
pub const LOW_CONFIDENCE: f64 = 0.5;

/// Eligibility thresholds for one label: `chl > chl_min` and
/// `sst_min < sst < sst_max` (an open upper side when `sst_max` is infinite).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub chl_min: f64,
    pub sst_min: f64,
    pub sst_max: f64,
}

impl Thresholds {
    const fn new(chl_min: f64, sst_min: f64, sst_max: f64) -> Self {
        Self { chl_min, sst_min, sst_max }
    }

    pub fn matches(&self, sst: f64, chl: f64) -> bool {
        chl > self.chl_min && sst > self.sst_min && sst < self.sst_max
    }
}

/// HIGH and MEDIUM thresholds for one season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonRules {
    pub high: Thresholds,
    pub medium: Thresholds,
}

pub const SUMMER: SeasonRules = SeasonRules {
    high: Thresholds::new(0.20, 24.0, 29.0),
    medium: Thresholds::new(0.10, 22.0, 30.0),
};

pub const WINTER: SeasonRules = SeasonRules {
    high: Thresholds::new(0.40, 16.0, f64::INFINITY),
    medium: Thresholds::new(0.25, 15.0, f64::INFINITY),
};

pub const SHOULDER: SeasonRules = SeasonRules {
    high: Thresholds::new(0.30, 18.0, 26.0),
    medium: Thresholds::new(0.15, 16.0, 28.0),
};

pub fn rules_for(season: Season) -> &'static SeasonRules {
    match season {
        Season::Summer => &SUMMER,
        Season::Winter => &WINTER,
        Season::Shoulder => &SHOULDER,
    }
}

/// Label only, without confidence.
pub fn seasonal_label(sst: f64, chl: f64, month: u32) -> ZoneLabel {
    let rules = rules_for(Season::from_month(month));
    if rules.high.matches(sst, chl) {
        ZoneLabel::High
    } else if rules.medium.matches(sst, chl) {
        ZoneLabel::Medium
    } else {
        ZoneLabel::Low
    }
}

/// Seasonal threshold classifier. Always available; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Infallible form of [`ZoneClassifier::classify`].
    pub fn evaluate(&self, sample: &EnvironmentalSample, month: u32) -> ZoneClassification {
        let label = seasonal_label(sample.sst, sample.chl, month);
        let confidence = match label {
            ZoneLabel::High => HIGH_BASE_CONFIDENCE + HIGH_JITTER * jitter(sample),
            ZoneLabel::Medium => MEDIUM_BASE_CONFIDENCE + MEDIUM_JITTER * jitter(sample),
            ZoneLabel::Low => LOW_CONFIDENCE,
        };
        ZoneClassification { label, confidence }
    }
}

/// Uniform [0, 1) draw from the cell's own jitter stream.
fn jitter(sample: &EnvironmentalSample) -> f64 {
    cell_rng(sample.seed ^ JITTER_SALT).gen::<f64>()
}

impl ZoneClassifier for RuleClassifier {
    fn name(&self) -> &'static str {
        "seasonal-rules"
    }

    fn classify(&self, sample: &EnvironmentalSample, month: u32) -> Result<ZoneClassification> {
        Ok(self.evaluate(sample, month))
    }
}
