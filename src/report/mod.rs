//! Reporting utilities: per-section summaries and formatted terminal output.

use crate::correlate::biozone_ages;
use crate::domain::{ControlPoint, Section, SedimentationRate};
use crate::error::AgeModelError;

pub mod format;

pub use format::*;

/// Everything the `build` summary prints about one section.
#[derive(Debug, Clone)]
pub struct SectionReport {
    pub name: String,
    pub is_reference: bool,
    pub rows: usize,
    pub rows_with_height: usize,
    pub height_range: Option<(f64, f64)>,
    pub age_range: Option<(f64, f64)>,
    pub control_points: Vec<ControlPoint>,
    pub sedimentation_rates: Vec<SedimentationRate>,
    pub biozone_ages: Vec<(String, f64)>,
    /// Why the section could not be aged, if it could not.
    pub error: Option<String>,
}

/// Summarize one section after a build.
pub fn section_report(section: &Section, is_reference: bool, outcome: Option<&Result<(), AgeModelError>>) -> SectionReport {
    let (control_points, sedimentation_rates) = match &section.model {
        Some(model) => (
            model.control_points().points().to_vec(),
            model.control_points().sedimentation_rates(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let biozone_ages = if section.model.is_some() {
        biozone_ages(section).unwrap_or_else(|e| {
            log::warn!("biozone ages for '{}': {e}", section.name);
            Vec::new()
        })
    } else {
        Vec::new()
    };

    SectionReport {
        name: section.name.clone(),
        is_reference,
        rows: section.samples.len(),
        rows_with_height: section.samples.iter().filter(|s| s.height.is_some()).count(),
        height_range: section.height_range(),
        age_range: section.age_range(),
        control_points,
        sedimentation_rates,
        biozone_ages,
        error: outcome.and_then(|o| o.as_ref().err()).map(ToString::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ControlPointSequence, Sample};
    use crate::models::PiecewiseAgeModel;

    #[test]
    fn report_reads_model_and_ages() {
        let mut section = Section::new(
            "ref",
            vec![
                Sample::at(0.0).with_age(100.0),
                Sample::at(4.0).with_marker("A", 4.0).with_age(96.0),
                Sample::default(),
            ],
        );
        let cps = ControlPointSequence::from_pairs(&[(0.0, 100.0), (4.0, 96.0)]).unwrap();
        section.model = Some(PiecewiseAgeModel::for_heights(cps, &[0.0, 4.0]));

        let report = section_report(&section, true, Some(&Ok(())));
        assert_eq!(report.rows, 3);
        assert_eq!(report.rows_with_height, 2);
        assert_eq!(report.age_range, Some((96.0, 100.0)));
        assert_eq!(report.control_points.len(), 2);
        assert_eq!(report.sedimentation_rates[0].rate, -1.0);
        assert_eq!(report.biozone_ages, vec![("A".to_string(), 96.0)]);
        assert!(report.error.is_none());
    }

    #[test]
    fn failed_section_carries_error() {
        let section = Section::new("t", vec![Sample::at(1.0)]);
        let outcome = Err(AgeModelError::UnknownSection("t".to_string()));
        let report = section_report(&section, false, Some(&outcome));
        assert!(report.control_points.is_empty());
        assert!(report.error.is_some());
    }
}
