//! Project configuration.
//!
//! A single `ProjectConfig` value describes one analysis: where the section
//! spreadsheets live, how their columns map onto the canonical schema, the
//! reference section and its dated control points, and (optionally) the
//! Monte-Carlo hiatus experiment. It is loaded once and passed explicitly to
//! ingest and to the engine.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{ControlPoint, ControlPointSequence};
use crate::error::AppError;
use crate::hiatus::HeightDistribution;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory holding the section CSV files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    pub sections: Vec<SectionSource>,
    pub reference_section: String,
    pub reference_control_points: Vec<ControlPoint>,
    #[serde(default)]
    pub columns: ColumnMap,
    /// Markers allowed to participate in correlation. Empty means all.
    #[serde(default)]
    pub biozones: Vec<String>,
    #[serde(default)]
    pub hiatus: Option<HiatusConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSource {
    pub name: String,
    pub file: PathBuf,
}

/// Canonical column names plus raw-header renames.
///
/// Header matching is case-insensitive; names here are normalized the same
/// way as CSV headers before lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default = "default_height_column")]
    pub height: String,
    #[serde(default = "default_marker_column")]
    pub marker: String,
    #[serde(default = "default_event_height_column")]
    pub event_height: String,
    #[serde(default = "default_age_column")]
    pub age: String,
    /// Raw header -> canonical header.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            height: default_height_column(),
            marker: default_marker_column(),
            event_height: default_event_height_column(),
            age: default_age_column(),
            rename: BTreeMap::new(),
        }
    }
}

/// Monte-Carlo hiatus experiment between two stacked sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiatusConfig {
    /// Section below the gap.
    pub lower_section: String,
    /// Section above the gap.
    pub upper_section: String,
    /// Row of `lower_section` at the gap (default: last row).
    #[serde(default)]
    pub lower_sample: Option<usize>,
    /// Row of `upper_section` at the gap (default: first row).
    #[serde(default)]
    pub upper_sample: Option<usize>,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Dated horizons, in stratigraphic order.
    pub dates: Vec<DatedHorizon>,
}

/// A radiometric date whose stratigraphic height is uncertain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatedHorizon {
    pub age: f64,
    pub height: HeightDistribution,
}

impl ProjectConfig {
    /// Check cross-field consistency that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.sections.is_empty() {
            return Err(AppError::new(2, "Config lists no sections."));
        }

        let mut seen = HashSet::new();
        for s in &self.sections {
            if !seen.insert(s.name.as_str()) {
                return Err(AppError::new(2, format!("Duplicate section name in config: `{}`", s.name)));
            }
        }

        if !seen.contains(self.reference_section.as_str()) {
            return Err(AppError::new(
                2,
                format!("Reference section `{}` is not listed in `sections`.", self.reference_section),
            ));
        }

        self.reference_sequence()?;

        if let Some(h) = &self.hiatus {
            for name in [&h.lower_section, &h.upper_section] {
                if !seen.contains(name.as_str()) {
                    return Err(AppError::new(2, format!("Hiatus section `{name}` is not listed in `sections`.")));
                }
            }
            if h.iterations == 0 {
                return Err(AppError::new(2, "Hiatus iterations must be > 0."));
            }
            if h.dates.len() < 2 {
                return Err(AppError::new(2, "Hiatus experiment needs at least 2 dated horizons."));
            }
        }

        Ok(())
    }

    /// The reference control points as a validated sequence.
    pub fn reference_sequence(&self) -> Result<ControlPointSequence, AppError> {
        ControlPointSequence::new(self.reference_control_points.clone()).map_err(|e| {
            AppError::new(2, format!("Invalid `reference_control_points`: {e}"))
        })
    }

    /// Marker allow-list, or `None` when every marker may be used.
    pub fn biozone_filter(&self) -> Option<&[String]> {
        if self.biozones.is_empty() {
            None
        } else {
            Some(&self.biozones)
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_height_column() -> String {
    "samp_height".to_string()
}

fn default_marker_column() -> String {
    "first_occurrence".to_string()
}

fn default_event_height_column() -> String {
    "bioheight".to_string()
}

fn default_age_column() -> String {
    "age".to_string()
}

fn default_iterations() -> usize {
    10_000
}

fn default_seed() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "sections": [{"name": "mill", "file": "mill.csv"}, {"name": "lb", "file": "lb.csv"}],
            "reference_section": "mill",
            "reference_control_points": [{"height": 0.0, "age": 100.0}, {"height": 10.0, "age": 90.0}]
        }"#
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let cfg: ProjectConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.columns.height, "samp_height");
        assert_eq!(cfg.columns.event_height, "bioheight");
        assert!(cfg.biozone_filter().is_none());
        assert!(cfg.hiatus.is_none());
        assert_eq!(cfg.data_dir, PathBuf::from("."));
    }

    #[test]
    fn validate_rejects_unknown_reference() {
        let mut cfg: ProjectConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.reference_section = "nope".to_string();
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_rejects_unordered_reference_points() {
        let mut cfg: ProjectConfig = serde_json::from_str(minimal_json()).unwrap();
        cfg.reference_control_points.reverse();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn hiatus_block_parses_tagged_distributions() {
        let json = r#"{
            "sections": [{"name": "ac1", "file": "a.csv"}, {"name": "ac2", "file": "b.csv"}],
            "reference_section": "ac1",
            "reference_control_points": [{"height": 0.0, "age": 1.0}, {"height": 1.0, "age": 0.0}],
            "hiatus": {
                "lower_section": "ac1",
                "upper_section": "ac2",
                "lower_sample": 212,
                "dates": [
                    {"age": -339.01, "height": {"kind": "grid", "min": 4.4, "max": 5.3, "steps": 50, "mean": 4.8, "sigma": 0.1}},
                    {"age": -333.87, "height": {"kind": "fixed", "height": 16.0}}
                ]
            }
        }"#;
        let cfg: ProjectConfig = serde_json::from_str(json).unwrap();
        cfg.validate().unwrap();
        let h = cfg.hiatus.unwrap();
        assert_eq!(h.iterations, 10_000);
        assert_eq!(h.seed, 42);
        assert_eq!(h.lower_sample, Some(212));
        assert_eq!(h.upper_sample, None);
        assert!(matches!(h.dates[1].height, HeightDistribution::Fixed { height } if height == 16.0));
    }
}
