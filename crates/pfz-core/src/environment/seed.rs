//! Per-cell seed derivation.
//!
//! Every (date, lat, lon) triple gets its own generator. The seed is a hash
//! of the formatted inputs, so results never depend on evaluation order or
//! on how cells are split across worker threads.

use std::hash::Hasher;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHasher;

/// Salt applied when the classifier derives its confidence jitter stream
/// from a sample seed, keeping it independent of the synthesis draws.
pub const JITTER_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Hash `"{date}{lat}{lon}"` into a 64-bit seed.
pub fn cell_seed(date: NaiveDate, lat: f64, lon: f64) -> u64 {
    let key = format!("{}{}{}", date.format("%Y-%m-%d"), lat, lon);
    let mut h = FxHasher::default();
    h.write(key.as_bytes());
    h.finish()
}

/// Fresh generator for one cell.
pub fn cell_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
