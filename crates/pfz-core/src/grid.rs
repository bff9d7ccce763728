//! Candidate lattice over the bounding box.
//!
//! Axis values are `min + i·res` for `i in 0..=⌈(max − min)/res⌉`, so the
//! enumeration runs one step past the nominal maximum whenever the span is
//! not an exact multiple of the resolution. Points beyond the box are
//! rejected later by the land/water bounding-box test.

use crate::coords::{BoundingBox, LatLon};
use crate::error::{PfzError, Result};

/// Upper bound on lattice size. A resolution small enough to exceed it is
/// treated as a configuration error rather than an allocation.
pub const MAX_GRID_CELLS: usize = 4_000_000;

/// Slack absorbed before rounding up, so a span that is a multiple of the
/// resolution up to float error does not gain an extra step.
const STEP_TOLERANCE: f64 = 1e-9;

/// Steps past `min` along one axis, as f64 so huge ratios can be rejected
/// before any integer conversion.
fn axis_steps(min: f64, max: f64, resolution: f64) -> f64 {
    ((max - min) / resolution - STEP_TOLERANCE).ceil().max(0.0)
}

/// Check the inputs and return `(n_lat, n_lon)`.
pub fn grid_dims(bbox: &BoundingBox, resolution: f64) -> Result<(usize, usize)> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(PfzError::invalid(format!(
            "grid resolution must be a positive number, got {resolution}"
        )));
    }
    if !bbox.is_finite() {
        return Err(PfzError::invalid("bounding box has non-finite bounds"));
    }
    if bbox.lat_min > bbox.lat_max {
        return Err(PfzError::invalid(format!(
            "lat_min {} exceeds lat_max {}",
            bbox.lat_min, bbox.lat_max
        )));
    }
    if bbox.lon_min > bbox.lon_max {
        return Err(PfzError::invalid(format!(
            "lon_min {} exceeds lon_max {}",
            bbox.lon_min, bbox.lon_max
        )));
    }

    let lat_len = axis_steps(bbox.lat_min, bbox.lat_max, resolution) + 1.0;
    let lon_len = axis_steps(bbox.lon_min, bbox.lon_max, resolution) + 1.0;
    let cells = lat_len * lon_len;
    if !cells.is_finite() || cells > MAX_GRID_CELLS as f64 {
        return Err(PfzError::invalid(format!(
            "grid of {lat_len} x {lon_len} cells exceeds the {MAX_GRID_CELLS} cell limit"
        )));
    }
    // Both factors are now bounded by the cap, so the casts are exact.
    Ok((lat_len as usize, lon_len as usize))
}

/// Generate the ordered lattice, latitude-major.
pub fn generate_grid(bbox: &BoundingBox, resolution: f64) -> Result<Vec<LatLon>> {
    let (n_lat, n_lon) = grid_dims(bbox, resolution)?;

    let mut cells = Vec::with_capacity(n_lat * n_lon);
    for i in 0..n_lat {
        let lat = bbox.lat_min + i as f64 * resolution;
        for j in 0..n_lon {
            let lon = bbox.lon_min + j as f64 * resolution;
            cells.push(LatLon::new(lat, lon));
        }
    }
    Ok(cells)
}
