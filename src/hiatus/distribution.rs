//! Height uncertainty for dated horizons.
//!
//! A radiometric date is usually tied to a bed whose stratigraphic position is
//! only known within a range. Each `HeightDistribution` describes that range;
//! `HeightSampler` is the prepared, ready-to-draw form.

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound on rejection attempts for truncated normal draws.
const MAX_REJECTIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HeightDistribution {
    /// `steps` evenly spaced candidate heights in `[min, max]`, weighted by a
    /// normal density centred on `mean`.
    Grid {
        min: f64,
        max: f64,
        steps: usize,
        mean: f64,
        sigma: f64,
    },
    /// Continuous normal draw, optionally truncated to `[min, max]`.
    Normal {
        mean: f64,
        sigma: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Height known exactly.
    Fixed { height: f64 },
}

/// `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn linspace(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::new(
            2,
            format!("Invalid height range: min={min}, max={max} (must be finite and max>min)."),
        ));
    }
    if steps < 2 {
        return Err(AppError::new(2, "Height grid steps must be >= 2."));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
    // Pin the endpoint against accumulated rounding.
    out[steps - 1] = max;
    Ok(out)
}

/// Normal density at each point, min-max scaled to `[0, 1]`.
///
/// The extremes of the grid get weight 0 and the point nearest `mean` gets
/// weight 1. If every density is equal the weights fall back to uniform.
pub fn normal_weights(points: &[f64], mean: f64, sigma: f64) -> Vec<f64> {
    let density: Vec<f64> = points
        .iter()
        .map(|&x| {
            let z = (x - mean) / sigma;
            (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
        })
        .collect();

    let lo = density.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = density.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    if !(span.is_finite() && span > 0.0) {
        return vec![1.0; points.len()];
    }
    density.iter().map(|d| (d - lo) / span).collect()
}

/// A height distribution ready for repeated draws.
#[derive(Debug, Clone)]
pub enum HeightSampler {
    Grid {
        heights: Vec<f64>,
        index: WeightedIndex<f64>,
    },
    Normal {
        normal: Normal<f64>,
        min: f64,
        max: f64,
    },
    Fixed(f64),
}

impl HeightSampler {
    pub fn new(dist: &HeightDistribution) -> Result<Self, AppError> {
        match *dist {
            HeightDistribution::Grid {
                min,
                max,
                steps,
                mean,
                sigma,
            } => {
                if !(sigma.is_finite() && sigma > 0.0) {
                    return Err(AppError::new(2, format!("Invalid grid sigma {sigma} (must be > 0).")));
                }
                let heights = linspace(min, max, steps)?;
                let weights = normal_weights(&heights, mean, sigma);
                let index = WeightedIndex::new(&weights)
                    .map_err(|e| AppError::new(2, format!("Invalid grid weights: {e}")))?;
                Ok(HeightSampler::Grid { heights, index })
            }
            HeightDistribution::Normal { mean, sigma, min, max } => {
                let normal = Normal::new(mean, sigma)
                    .map_err(|e| AppError::new(2, format!("Invalid normal height distribution: {e}")))?;
                let min = min.unwrap_or(f64::NEG_INFINITY);
                let max = max.unwrap_or(f64::INFINITY);
                if !(min < max) {
                    return Err(AppError::new(2, format!("Invalid truncation bounds [{min}, {max}].")));
                }
                Ok(HeightSampler::Normal { normal, min, max })
            }
            HeightDistribution::Fixed { height } => {
                if !height.is_finite() {
                    return Err(AppError::new(2, "Fixed height must be finite."));
                }
                Ok(HeightSampler::Fixed(height))
            }
        }
    }

    /// Draw one height.
    ///
    /// A truncated normal whose bounds are far in the tails can exhaust the
    /// rejection budget; the draw is then clamped into the bounds.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            HeightSampler::Grid { heights, index } => heights[index.sample(rng)],
            HeightSampler::Normal { normal, min, max } => {
                for _ in 0..MAX_REJECTIONS {
                    let h = normal.sample(rng);
                    if h >= *min && h <= *max {
                        return h;
                    }
                }
                normal.mean().clamp(*min, *max)
            }
            HeightSampler::Fixed(h) => *h,
        }
    }
}
