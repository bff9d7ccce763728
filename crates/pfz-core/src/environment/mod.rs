//! Synthetic environmental features (sea-surface temperature, chlorophyll).
//!
//! Stands in for live satellite/sensor data. Values follow the monthly
//! climatology with a spatial gradient and a small seeded perturbation:
//!   SST: warmest at the southern edge, coolest at the northern edge.
//!   CHL: richest near the south-west corner edges, decaying over 3°.

pub mod seasonal;
pub mod seed;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::coords::{BoundingBox, LatLon};
use seasonal::MonthlyRanges;
use seed::{cell_rng, cell_seed};

/// Standard deviation of the SST perturbation (°C).
pub const SST_NOISE_SIGMA: f64 = 0.3;
/// Standard deviation of the chlorophyll perturbation (mg/m³).
pub const CHL_NOISE_SIGMA: f64 = 0.05;
/// Chlorophyll never drops below this concentration (mg/m³).
pub const CHL_FLOOR: f64 = 0.05;
/// Distance (degrees) over which the coastal chlorophyll boost decays to zero.
pub const COAST_DECAY_DEG: f64 = 3.0;
/// Share of the chlorophyll range every cell receives regardless of proximity.
const CHL_BASE_SHARE: f64 = 0.3;
const CHL_COAST_SHARE: f64 = 0.7;

/// One synthesized observation for a cell and date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalSample {
    pub position: LatLon,
    pub date: NaiveDate,
    /// Sea-surface temperature, °C.
    pub sst: f64,
    /// Chlorophyll-a concentration, mg/m³.
    pub chl: f64,
    /// Seed derived from (date, lat, lon); downstream stages derive their own
    /// per-cell streams from it.
    pub seed: u64,
}

impl EnvironmentalSample {
    pub fn month(&self) -> u32 {
        self.date.month()
    }
}

/// Deterministic feature generator for one bounding box and climatology.
#[derive(Debug, Clone)]
pub struct FeatureSynthesizer {
    bbox: BoundingBox,
    sst_ranges: MonthlyRanges,
    chl_ranges: MonthlyRanges,
}

impl FeatureSynthesizer {
    pub fn new(bbox: BoundingBox, sst_ranges: MonthlyRanges, chl_ranges: MonthlyRanges) -> Self {
        Self { bbox, sst_ranges, chl_ranges }
    }

    /// Synthesize the sample for `(date, lat, lon)`.
    ///
    /// Pure: the only randomness comes from a generator seeded by the inputs.
    pub fn sample(&self, date: NaiveDate, position: LatLon) -> EnvironmentalSample {
        let month = date.month();
        let seed = cell_seed(date, position.lat, position.lon);
        let mut rng = cell_rng(seed);

        // SST draw first, then CHL.
        let sst_noise: f64 = rng.sample::<f64, _>(StandardNormal) * SST_NOISE_SIGMA;
        let chl_noise: f64 = rng.sample::<f64, _>(StandardNormal) * CHL_NOISE_SIGMA;

        let sst = self.sst_base(month, position) + sst_noise;
        let chl = (self.chl_base(month, position) + chl_noise).max(CHL_FLOOR);

        EnvironmentalSample { position, date, sst, chl, seed }
    }

    /// Noise-free SST for the month and position.
    pub fn sst_base(&self, month: u32, p: LatLon) -> f64 {
        let range = self.sst_ranges.get(month);
        let lat_factor = latitude_factor(&self.bbox, p.lat);
        range.max - lat_factor * range.span()
    }

    /// Noise-free chlorophyll (before the floor) for the month and position.
    pub fn chl_base(&self, month: u32, p: LatLon) -> f64 {
        let range = self.chl_ranges.get(month);
        let coast = coastal_factor(&self.bbox, p);
        range.min + range.span() * (CHL_BASE_SHARE + CHL_COAST_SHARE * coast)
    }
}

/// 0 at the southern edge of the box, 1 at the northern edge.
fn latitude_factor(bbox: &BoundingBox, lat: f64) -> f64 {
    let span = bbox.lat_span();
    if span <= 0.0 {
        return 0.0;
    }
    (lat - bbox.lat_min) / span
}

/// Coastal-proximity proxy in [0, 1]: the smaller of the offsets from the
/// south-west corner's two edges, decayed linearly over `COAST_DECAY_DEG`.
fn coastal_factor(bbox: &BoundingBox, p: LatLon) -> f64 {
    let sw = bbox.south_west();
    let coast_dist = (p.lon - sw.lon).abs().min((p.lat - sw.lat).abs());
    (1.0 - coast_dist / COAST_DECAY_DEG).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synth() -> FeatureSynthesizer {
        FeatureSynthesizer::new(
            BoundingBox::new(33.0, 37.5, 8.0, 12.0),
            MonthlyRanges::default_sst(),
            MonthlyRanges::default_chl(),
        )
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn identical_inputs_identical_samples() {
        let s = synth();
        let p = LatLon::new(35.2, 11.05);
        let a = s.sample(date("2024-07-15"), p);
        let b = s.sample(date("2024-07-15"), p);
        assert_eq!(a, b);
    }

    #[test]
    fn call_order_does_not_matter() {
        let s = synth();
        let d = date("2024-03-01");
        let p = LatLon::new(36.0, 10.0);
        let first = s.sample(d, p);
        for i in 0..50 {
            s.sample(d, LatLon::new(33.0 + i as f64 * 0.05, 11.0));
        }
        assert_eq!(first, s.sample(d, p));
    }

    #[test]
    fn sst_is_warmest_in_the_south() {
        let s = synth();
        // July: 24–28 °C.
        assert_relative_eq!(s.sst_base(7, LatLon::new(33.0, 10.0)), 28.0);
        assert_relative_eq!(s.sst_base(7, LatLon::new(37.5, 10.0)), 24.0);
        assert_relative_eq!(s.sst_base(7, LatLon::new(35.25, 10.0)), 26.0);
    }

    #[test]
    fn chl_decays_away_from_reference_edges() {
        let s = synth();
        // January: 0.2–0.8. At the edge: 0.2 + 0.6 * 1.0 = 0.8.
        assert_relative_eq!(s.chl_base(1, LatLon::new(33.0, 11.0)), 0.8, epsilon = 1e-12);
        // Beyond the 3° decay radius from both edges: 0.2 + 0.6 * 0.3 = 0.38.
        assert_relative_eq!(s.chl_base(1, LatLon::new(36.5, 11.5)), 0.38, epsilon = 1e-12);
        // Halfway: 1.5° from the western edge, further from the southern one.
        assert_relative_eq!(
            s.chl_base(1, LatLon::new(36.0, 9.5)),
            0.2 + 0.6 * (0.3 + 0.7 * 0.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn perturbation_stays_small() {
        let s = synth();
        let d = date("2024-08-10");
        for i in 0..200 {
            let p = LatLon::new(33.0 + (i % 20) as f64 * 0.2, 8.0 + (i / 20) as f64 * 0.4);
            let smp = s.sample(d, p);
            let dev = smp.sst - s.sst_base(8, p);
            assert!(dev.abs() < 6.0 * SST_NOISE_SIGMA, "sst deviation {dev} at {p:?}");
        }
    }

    #[test]
    fn chlorophyll_is_floored() {
        // A degenerate climatology that would go negative without the floor.
        let mut chl = MonthlyRanges::default_chl();
        for r in chl.0.iter_mut() {
            *r = seasonal::MonthRange::new(-1.0, -1.0);
        }
        let s = FeatureSynthesizer::new(
            BoundingBox::new(33.0, 37.5, 8.0, 12.0),
            MonthlyRanges::default_sst(),
            chl,
        );
        let smp = s.sample(date("2024-05-05"), LatLon::new(34.0, 9.0));
        assert_relative_eq!(smp.chl, CHL_FLOOR);
    }

    #[test]
    fn sample_records_month_and_seed() {
        let s = synth();
        let d = date("2024-12-24");
        let p = LatLon::new(34.5, 11.5);
        let smp = s.sample(d, p);
        assert_eq!(smp.month(), 12);
        assert_eq!(smp.seed, cell_seed(d, p.lat, p.lon));
    }
}
