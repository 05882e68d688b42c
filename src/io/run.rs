//! Read/write hiatus run JSON files.
//!
//! A run file is the portable record of one Monte-Carlo hiatus run:
//! the experiment settings, every accepted draw and the summary. The
//! `histogram` command re-renders it without re-running the model.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::HiatusConfig;
use crate::error::AppError;
use crate::hiatus::{HiatusDraw, HiatusEstimator, HiatusRun, HiatusSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiatusRunFile {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub lower_section: String,
    pub upper_section: String,
    pub lower_sample: usize,
    pub upper_sample: usize,
    pub iterations: usize,
    pub seed: u64,
    pub rejected: usize,
    pub summary: HiatusSummary,
    pub draws: Vec<HiatusDraw>,
}

impl HiatusRunFile {
    pub fn new(config: &HiatusConfig, estimator: &HiatusEstimator, iterations: usize, seed: u64, run: &HiatusRun) -> Self {
        Self {
            tool: "strat-age".to_string(),
            created_at: Utc::now(),
            lower_section: config.lower_section.clone(),
            upper_section: config.upper_section.clone(),
            lower_sample: estimator.lower_row(),
            upper_sample: estimator.upper_row(),
            iterations,
            seed,
            rejected: run.rejected,
            summary: run.summary.clone(),
            draws: run.draws.clone(),
        }
    }

    /// Accepted hiatus values in iteration order.
    pub fn hiatus_values(&self) -> Vec<f64> {
        self.draws.iter().map(|d| d.hiatus).collect()
    }
}

/// Write a run JSON file.
pub fn write_run_json(path: &Path, run: &HiatusRunFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create run JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, run).map_err(|e| AppError::new(2, format!("Failed to write run JSON: {e}")))?;
    Ok(())
}

/// Read a run JSON file.
pub fn read_run_json(path: &Path) -> Result<HiatusRunFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open run JSON '{}': {e}", path.display())))?;
    let run: HiatusRunFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid run JSON: {e}")))?;
    if run.draws.is_empty() {
        return Err(AppError::new(3, "Run JSON has no accepted draws."));
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hiatus::summarize;

    fn run_file() -> HiatusRunFile {
        let draws: Vec<HiatusDraw> = [1.5, 2.5, 2.0]
            .iter()
            .enumerate()
            .map(|(i, &h)| HiatusDraw {
                iteration: i,
                heights: vec![0.0, 30.0],
                lower_age: 90.0,
                upper_age: 90.0 - h,
                hiatus: h,
            })
            .collect();
        HiatusRunFile {
            tool: "strat-age".to_string(),
            created_at: Utc::now(),
            lower_section: "lower".to_string(),
            upper_section: "upper".to_string(),
            lower_sample: 10,
            upper_sample: 0,
            iterations: 4,
            seed: 42,
            rejected: 1,
            summary: summarize(&[1.5, 2.5, 2.0]).unwrap(),
            draws,
        }
    }

    #[test]
    fn run_file_survives_disk() {
        let path = std::env::temp_dir().join(format!("strat-age-run-{}.json", std::process::id()));
        let run = run_file();
        write_run_json(&path, &run).unwrap();
        let back = read_run_json(&path).unwrap();
        assert_eq!(back, run);
        assert_eq!(back.hiatus_values(), vec![1.5, 2.5, 2.0]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_run_file_is_rejected() {
        let path = std::env::temp_dir().join(format!("strat-age-run-empty-{}.json", std::process::id()));
        let mut run = run_file();
        run.draws.clear();
        write_run_json(&path, &run).unwrap();
        assert_eq!(read_run_json(&path).unwrap_err().exit_code(), 3);
        std::fs::remove_file(&path).ok();
    }
}
