//! Monte-Carlo hiatus estimation.
//!
//! Two sections stacked across an unconformity are aged repeatedly with
//! control points whose heights are redrawn each iteration. The hiatus for
//! one draw is the age at the top of the lower section minus the age at the
//! base of the upper section.
//!
//! Iterations are independent: the engine (and its already-built reference)
//! is only read, every iteration builds its own models, and each iteration's
//! RNG is seeded from `(seed, iteration)` so results do not depend on thread
//! scheduling.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{ControlPoint, ControlPointSequence, HiatusConfig};
use crate::engine::AgeModelEngine;
use crate::error::{AgeModelError, AppError};
use crate::hiatus::distribution::HeightSampler;

/// One accepted Monte-Carlo draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiatusDraw {
    pub iteration: usize,
    /// Drawn heights, one per dated horizon.
    pub heights: Vec<f64>,
    pub lower_age: f64,
    pub upper_age: f64,
    pub hiatus: f64,
}

/// Distribution summary of the accepted hiatus values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiatusSummary {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub p05: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

/// Output of a full estimation run.
#[derive(Debug, Clone)]
pub struct HiatusRun {
    pub draws: Vec<HiatusDraw>,
    /// Draws whose heights were not strictly increasing.
    pub rejected: usize,
    pub summary: HiatusSummary,
}

/// Prepared experiment: samplers plus resolved row indices.
#[derive(Debug, Clone)]
pub struct HiatusEstimator {
    lower_section: String,
    upper_section: String,
    lower_row: usize,
    upper_row: usize,
    ages: Vec<f64>,
    samplers: Vec<HeightSampler>,
    seed: u64,
}

impl HiatusEstimator {
    /// Resolve the experiment against the engine's sections.
    pub fn new(config: &HiatusConfig, engine: &AgeModelEngine) -> Result<Self, AppError> {
        let lower = engine.section(&config.lower_section)?;
        let upper = engine.section(&config.upper_section)?;

        let lower_row = match config.lower_sample {
            Some(row) => row,
            None => lower
                .samples
                .len()
                .checked_sub(1)
                .ok_or_else(|| AppError::new(3, format!("Section `{}` has no samples.", lower.name)))?,
        };
        let upper_row = config.upper_sample.unwrap_or(0);

        for (section, row) in [(lower, lower_row), (upper, upper_row)] {
            let Some(sample) = section.samples.get(row) else {
                return Err(AppError::new(
                    2,
                    format!("Section `{}` has no row {row} ({} rows).", section.name, section.samples.len()),
                ));
            };
            if sample.height.is_none() {
                return Err(AppError::new(
                    2,
                    format!("Row {row} of section `{}` has no height to age.", section.name),
                ));
            }
        }

        let samplers = config
            .dates
            .iter()
            .map(|d| HeightSampler::new(&d.height))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            lower_section: config.lower_section.clone(),
            upper_section: config.upper_section.clone(),
            lower_row,
            upper_row,
            ages: config.dates.iter().map(|d| d.age).collect(),
            samplers,
            seed: config.seed,
        })
    }

    /// Resolved row of the lower section at the gap.
    pub fn lower_row(&self) -> usize {
        self.lower_row
    }

    /// Resolved row of the upper section at the gap.
    pub fn upper_row(&self) -> usize {
        self.upper_row
    }

    /// Draw the control points for one iteration (not yet validated).
    pub fn draw_points(&self, iteration: usize) -> Vec<ControlPoint> {
        let mut rng = StdRng::seed_from_u64(iteration_seed(self.seed, iteration));
        self.samplers
            .iter()
            .zip(&self.ages)
            .map(|(sampler, &age)| ControlPoint::new(sampler.sample(&mut rng), age))
            .collect()
    }

    /// Evaluate one iteration. `Ok(None)` means the draw was rejected as non-monotonic.
    pub fn run_iteration(&self, engine: &AgeModelEngine, iteration: usize) -> Result<Option<HiatusDraw>, AgeModelError> {
        let points = self.draw_points(iteration);
        let heights: Vec<f64> = points.iter().map(|p| p.height).collect();

        let cps = match ControlPointSequence::new(points) {
            Ok(cps) => cps,
            Err(AgeModelError::NonMonotonicControlPoints { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let lower = engine.build_from_control_points(&self.lower_section, cps.clone())?;
        let upper = engine.build_from_control_points(&self.upper_section, cps)?;

        // Rows were checked for heights in `new`, so both ages are present.
        let (Some(lower_age), Some(upper_age)) = (lower.age_at_row(self.lower_row), upper.age_at_row(self.upper_row))
        else {
            return Err(AgeModelError::EmptyInput);
        };

        Ok(Some(HiatusDraw {
            iteration,
            heights,
            lower_age,
            upper_age,
            hiatus: lower_age - upper_age,
        }))
    }

    /// Run `iterations` draws in parallel.
    pub fn run(&self, engine: &AgeModelEngine, iterations: usize) -> Result<HiatusRun, AppError> {
        log::info!(
            "hiatus: {} iterations between '{}' row {} and '{}' row {}",
            iterations,
            self.lower_section,
            self.lower_row,
            self.upper_section,
            self.upper_row
        );

        let results: Vec<Result<Option<HiatusDraw>, AgeModelError>> = (0..iterations)
            .into_par_iter()
            .map(|i| self.run_iteration(engine, i))
            .collect();

        let mut draws = Vec::with_capacity(iterations);
        let mut rejected = 0usize;
        for r in results {
            match r? {
                Some(draw) => draws.push(draw),
                None => rejected += 1,
            }
        }

        if rejected > 0 {
            log::warn!("hiatus: rejected {rejected} of {iterations} draws with non-increasing heights");
        }

        let values: Vec<f64> = draws.iter().map(|d| d.hiatus).collect();
        let summary = summarize(&values)
            .ok_or_else(|| AppError::new(3, "No accepted draws; cannot summarize hiatus distribution."))?;

        Ok(HiatusRun {
            draws,
            rejected,
            summary,
        })
    }
}

/// Per-iteration seed derived from the run seed.
fn iteration_seed(seed: u64, iteration: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    iteration.hash(&mut hasher);
    hasher.finish()
}

/// Summary statistics; `None` for an empty or non-finite input.
pub fn summarize(values: &[f64]) -> Option<HiatusSummary> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let var = if n > 1 {
        sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n as f64 - 1.0)
    } else {
        0.0
    };

    Some(HiatusSummary {
        n,
        mean,
        median: quantile(&sorted, 0.5),
        std_dev: var.sqrt(),
        p05: quantile(&sorted, 0.05),
        p95: quantile(&sorted, 0.95),
        min: sorted[0],
        max: sorted[n - 1],
    })
}

/// Linear-interpolated quantile of sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
