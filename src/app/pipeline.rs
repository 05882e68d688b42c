//! Shared workflow used by every command.
//!
//! config -> ingest -> engine -> (build | correlate | hiatus)
//!
//! The command handlers in `app` only deal with presentation.

use std::path::Path;

use crate::correlate::BiozoneTie;
use crate::domain::{ControlPointSequence, HiatusConfig};
use crate::engine::AgeModelEngine;
use crate::error::AppError;
use crate::hiatus::HiatusEstimator;
use crate::io::{HiatusRunFile, LoadedConfig, RowNote, SectionStats, load_config, load_sections, resolve_config_path};
use crate::report::{SectionReport, section_report};

/// A loaded project: validated config plus an engine over the ingested sections.
#[derive(Debug, Clone)]
pub struct Project {
    pub loaded: LoadedConfig,
    pub ingest_reports: Vec<(String, SectionStats, Vec<RowNote>)>,
    pub engine: AgeModelEngine,
}

/// Load the config (from `--config` or the environment) and ingest every section.
pub fn load_project(config_path: Option<&Path>) -> Result<Project, AppError> {
    let path = resolve_config_path(config_path)?;
    let loaded = load_config(&path)?;
    let ingest = load_sections(&loaded.config, &loaded.base_dir)?;

    let engine = AgeModelEngine::new(ingest.store, loaded.config.reference_sequence()?)
        .with_biozones(loaded.config.biozone_filter().map(<[String]>::to_vec));

    Ok(Project {
        loaded,
        ingest_reports: ingest.reports,
        engine,
    })
}

/// Age every section and summarize each one.
pub fn run_build(project: &mut Project) -> Result<Vec<SectionReport>, AppError> {
    let outcomes = project.engine.build_all()?;
    let store = project.engine.store();

    let mut reports = Vec::with_capacity(outcomes.len());
    for (name, outcome) in &outcomes {
        let section = store.get(name)?;
        let is_reference = name == store.reference_name();
        reports.push(section_report(section, is_reference, Some(outcome)));
    }
    Ok(reports)
}

/// Tie table and control points for one section, without writing ages to it.
pub fn run_correlate(project: &mut Project, section: &str) -> Result<(Vec<BiozoneTie>, ControlPointSequence), AppError> {
    let engine = &mut project.engine;
    if !engine.is_reference_built() {
        engine.build_reference_model()?;
    }

    let cps = engine.correlate(section)?;
    let ties = if section == engine.store().reference_name() {
        Vec::new()
    } else {
        let reference = engine.store().reference()?;
        let target = engine.section(section)?;
        engine
            .correlator(reference)
            .ties(target)
            .map_err(|e| e.in_section(section))?
    };
    Ok((ties, cps))
}

/// Run the configured Monte-Carlo hiatus estimate, with optional overrides.
pub fn run_hiatus(project: &mut Project, iterations: Option<usize>, seed: Option<u64>) -> Result<HiatusRunFile, AppError> {
    let mut config: HiatusConfig = project
        .loaded
        .config
        .hiatus
        .clone()
        .ok_or_else(|| AppError::new(2, "Config has no `hiatus` block."))?;
    if let Some(n) = iterations {
        config.iterations = n;
    }
    if let Some(s) = seed {
        config.seed = s;
    }
    if config.iterations == 0 {
        return Err(AppError::new(2, "Hiatus iterations must be >= 1."));
    }

    // The reference is aged once here and only read by the parallel draws.
    project.engine.build_reference_model()?;
    let engine = &project.engine;

    let estimator = HiatusEstimator::new(&config, engine)?;
    let run = estimator.run(engine, config.iterations)?;

    Ok(HiatusRunFile::new(&config, &estimator, config.iterations, config.seed, &run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Reference aged 100 - h, a correlated section, and two sections across a gap.
    fn write_project(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strat-age-pipeline-{tag}-{}", std::process::id()));
        let data = dir.join("data");
        std::fs::create_dir_all(&data).unwrap();

        std::fs::write(
            data.join("ref.csv"),
            "samp_height,d13c,first_occurrence,bioheight\n\
             0,1.0,,\n4,1.1,A,5\n8,1.2,,\n12,1.3,,\n16,1.4,B,15\n20,1.5,,\n",
        )
        .unwrap();
        std::fs::write(
            data.join("tgt.csv"),
            "samp_height,d13c,first_occurrence,bioheight\n0,2.0,,\n2,2.1,A,2\n16,2.2,,\n30,2.3,B,30\n",
        )
        .unwrap();
        std::fs::write(data.join("low.csv"), "samp_height\n0\n5\n10\n").unwrap();
        std::fs::write(data.join("up.csv"), "samp_height\n20\n25\n30\n").unwrap();

        let config = r#"{
            "data_dir": "data",
            "sections": [
                {"name": "ref", "file": "ref.csv"},
                {"name": "tgt", "file": "tgt.csv"},
                {"name": "low", "file": "low.csv"},
                {"name": "up", "file": "up.csv"}
            ],
            "reference_section": "ref",
            "reference_control_points": [{"height": 0.0, "age": 100.0}, {"height": 16.0, "age": 84.0}],
            "hiatus": {
                "lower_section": "low",
                "upper_section": "up",
                "iterations": 16,
                "dates": [
                    {"age": 100.0, "height": {"kind": "fixed", "height": 0.0}},
                    {"age": 70.0, "height": {"kind": "fixed", "height": 30.0}}
                ]
            }
        }"#;
        std::fs::write(dir.join("project.json"), config).unwrap();
        dir
    }

    #[test]
    fn build_ages_correlated_sections_and_reports_failures() {
        let dir = write_project("build");
        let mut project = load_project(Some(&dir.join("project.json"))).unwrap();
        let reports = run_build(&mut project).unwrap();

        assert_eq!(reports.len(), 4);
        assert!(reports[0].is_reference);
        assert_eq!(reports[0].age_range, Some((80.0, 100.0)));
        assert_eq!(reports[1].control_points.len(), 2);
        assert!(reports[1].error.is_none());
        assert!(reports[2].error.is_some());

        let tgt = project.engine.section("tgt").unwrap();
        assert_eq!(tgt.samples[1].age, Some(96.0));
        assert_eq!(tgt.samples[3].age, Some(84.0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn correlate_returns_ties_without_writing() {
        let dir = write_project("correlate");
        let mut project = load_project(Some(&dir.join("project.json"))).unwrap();
        let (ties, cps) = run_correlate(&mut project, "tgt").unwrap();
        assert_eq!(ties.len(), 2);
        assert_eq!(cps, ControlPointSequence::from_pairs(&[(2.0, 96.0), (30.0, 84.0)]).unwrap());
        assert!(!project.engine.section("tgt").unwrap().has_ages());

        let (ties, cps) = run_correlate(&mut project, "ref").unwrap();
        assert!(ties.is_empty());
        assert_eq!(cps.len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reference_csv_with_ages_is_rebuilt_from_control_points() {
        let dir = write_project("aged-ref");
        std::fs::write(
            dir.join("data").join("ref.csv"),
            "samp_height,first_occurrence,bioheight,age\n\
             0,,,0\n4,A,5,0\n8,,,0\n12,,,0\n16,B,15,0\n20,,,0\n",
        )
        .unwrap();

        let mut project = load_project(Some(&dir.join("project.json"))).unwrap();
        assert!(project.engine.section("ref").unwrap().has_ages());
        let (_, cps) = run_correlate(&mut project, "tgt").unwrap();
        assert_eq!(cps, ControlPointSequence::from_pairs(&[(2.0, 96.0), (30.0, 84.0)]).unwrap());

        let reports = run_build(&mut project).unwrap();
        assert_eq!(reports[0].age_range, Some((80.0, 100.0)));
        assert_eq!(reports[1].control_points.len(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn hiatus_uses_overrides() {
        let dir = write_project("hiatus");
        let mut project = load_project(Some(&dir.join("project.json"))).unwrap();
        let run = run_hiatus(&mut project, Some(8), Some(7)).unwrap();
        assert_eq!(run.iterations, 8);
        assert_eq!(run.seed, 7);
        assert_eq!(run.draws.len(), 8);
        assert_eq!((run.lower_sample, run.upper_sample), (2, 0));
        // One age unit per metre: 90 at the top of `low`, 80 at the base of `up`.
        assert!((run.summary.median - 10.0).abs() < 1e-9);

        assert_eq!(run_hiatus(&mut project, Some(0), None).unwrap_err().exit_code(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}
