//! Nearest-sample lookup.
//!
//! Used to snap a marker-event height onto an actual sampled row so that row's
//! already-assigned age can be read off.

use crate::error::AgeModelError;

/// Index of the height closest to `query`.
///
/// Ties resolve to the first occurrence. Heights need not be sorted. A NaN
/// height never wins (its distance compares false against everything).
pub fn nearest(heights: &[f64], query: f64) -> Result<usize, AgeModelError> {
    let (first, rest) = heights.split_first().ok_or(AgeModelError::EmptyInput)?;

    let mut best_idx = 0;
    let mut best_dist = (first - query).abs();
    for (offset, h) in rest.iter().enumerate() {
        let dist = (h - query).abs();
        // Strict `<` keeps the earliest index on ties.
        if dist < best_dist || best_dist.is_nan() {
            best_idx = offset + 1;
            best_dist = dist;
        }
    }
    Ok(best_idx)
}
