//! Monthly climatology tables and seasonal grouping.
//!
//! Each calendar month maps to a (min, max) range for sea-surface temperature
//! and chlorophyll. Months are also grouped into three seasons that drive the
//! rule-based zone thresholds:
//!   - Summer: June to August.
//!   - Winter: December to February.
//!   - Shoulder: every other month (spring and autumn).

use serde::{Deserialize, Serialize};

use crate::error::{PfzError, Result};

/// Seasonal group used by the rule-based classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Summer,
    Winter,
    Shoulder,
}

impl Season {
    /// Season for a 1-based calendar month.
    pub fn from_month(month: u32) -> Self {
        match month {
            6..=8 => Season::Summer,
            12 | 1 | 2 => Season::Winter,
            _ => Season::Shoulder,
        }
    }
}

/// Inclusive (min, max) value range for one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthRange {
    pub min: f64,
    pub max: f64,
}

impl MonthRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Twelve month ranges, January first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyRanges(pub [MonthRange; 12]);

impl MonthlyRanges {
    /// Range for a 1-based calendar month. Out-of-range months clamp to the
    /// nearest valid month; `chrono` never produces them.
    pub fn get(&self, month: u32) -> MonthRange {
        let idx = month.clamp(1, 12) as usize - 1;
        self.0[idx]
    }

    /// Mediterranean sea-surface temperature climatology (°C).
    pub fn default_sst() -> Self {
        Self([
            MonthRange::new(14.0, 17.0),
            MonthRange::new(14.0, 17.0),
            MonthRange::new(15.0, 18.0),
            MonthRange::new(16.0, 19.0),
            MonthRange::new(18.0, 22.0),
            MonthRange::new(21.0, 25.0),
            MonthRange::new(24.0, 28.0),
            MonthRange::new(26.0, 30.0),
            MonthRange::new(24.0, 28.0),
            MonthRange::new(21.0, 25.0),
            MonthRange::new(18.0, 22.0),
            MonthRange::new(15.0, 19.0),
        ])
    }

    /// Chlorophyll-a climatology (mg/m³).
    pub fn default_chl() -> Self {
        Self([
            MonthRange::new(0.20, 0.80),
            MonthRange::new(0.20, 0.80),
            MonthRange::new(0.20, 0.70),
            MonthRange::new(0.15, 0.60),
            MonthRange::new(0.10, 0.50),
            MonthRange::new(0.10, 0.40),
            MonthRange::new(0.08, 0.30),
            MonthRange::new(0.07, 0.30),
            MonthRange::new(0.10, 0.40),
            MonthRange::new(0.12, 0.50),
            MonthRange::new(0.15, 0.60),
            MonthRange::new(0.20, 0.70),
        ])
    }

    /// Every range must be finite with `min <= max`.
    pub fn validate(&self, name: &str) -> Result<()> {
        for (i, r) in self.0.iter().enumerate() {
            if !r.min.is_finite() || !r.max.is_finite() || r.min > r.max {
                return Err(PfzError::invalid(format!(
                    "{name} range for month {} is invalid: ({}, {})",
                    i + 1,
                    r.min,
                    r.max
                )));
            }
        }
        Ok(())
    }
}
