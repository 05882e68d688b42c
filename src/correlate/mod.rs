//! Biozone correlation.
//!
//! Derives control points for a target section from marker taxa it shares
//! with an already-aged reference section. For each shared marker:
//!
//! 1. take the marker's event height in the reference section
//! 2. snap it to the nearest reference sample that has a height
//! 3. read that sample's age
//! 4. pair it with the marker's event height in the target section
//!
//! Shared markers are taken in the target section's row order; that order
//! becomes the control-point order and must be height-increasing, which the
//! `ControlPointSequence` constructor checks.

use serde::Serialize;

use crate::domain::{ControlPoint, ControlPointSequence, Section};
use crate::error::AgeModelError;
use crate::math::nearest;

/// Audit record for one shared marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiozoneTie {
    pub marker: String,
    /// Event height of the marker in the reference section.
    pub reference_event_height: f64,
    /// Row index of the reference sample nearest that event height.
    pub reference_row: usize,
    pub reference_height: f64,
    /// Age read from the reference sample.
    pub age: f64,
    /// Event height of the marker in the target section.
    pub target_height: f64,
}

impl BiozoneTie {
    pub fn control_point(&self) -> ControlPoint {
        ControlPoint::new(self.target_height, self.age)
    }
}

/// Correlates target sections against one reference section.
#[derive(Debug, Clone, Copy)]
pub struct BiozoneCorrelator<'a> {
    reference: &'a Section,
    /// Optional marker allow-list.
    markers: Option<&'a [String]>,
}

impl<'a> BiozoneCorrelator<'a> {
    pub fn new(reference: &'a Section) -> Self {
        Self {
            reference,
            markers: None,
        }
    }

    /// Only correlate on markers in `markers`.
    pub fn with_markers(mut self, markers: Option<&'a [String]>) -> Self {
        self.markers = markers;
        self
    }

    /// Markers present in both sections, in target row order.
    pub fn shared_markers<'t>(&self, target: &'t Section) -> Vec<&'t str> {
        let reference_markers = self.reference.markers();
        target
            .markers()
            .into_iter()
            .filter(|m| reference_markers.iter().any(|r| r == m))
            .filter(|m| self.markers.is_none_or(|allowed| allowed.iter().any(|a| a == *m)))
            .collect()
    }

    /// One tie per shared marker.
    pub fn ties(&self, target: &Section) -> Result<Vec<BiozoneTie>, AgeModelError> {
        if self.reference.model.is_none() {
            return Err(AgeModelError::ReferenceNotBuilt {
                reference: self.reference.name.clone(),
            });
        }

        let (rows, heights) = self.reference.present_heights();
        let shared = self.shared_markers(target);
        let mut ties = Vec::with_capacity(shared.len());

        for marker in shared {
            let reference_event_height = event_height(self.reference, marker)?;
            let target_height = event_height(target, marker)?;

            let idx = nearest(&heights, reference_event_height)?;
            let reference_row = rows[idx];
            let age = self.reference.samples[reference_row].age.ok_or_else(|| {
                AgeModelError::ReferenceNotBuilt {
                    reference: self.reference.name.clone(),
                }
            })?;

            ties.push(BiozoneTie {
                marker: marker.to_string(),
                reference_event_height,
                reference_row,
                reference_height: heights[idx],
                age,
                target_height,
            });
        }

        log::debug!(
            "correlated '{}' against '{}' on {} shared markers",
            target.name,
            self.reference.name,
            ties.len()
        );
        Ok(ties)
    }

    /// Control points for `target`, one per shared marker.
    pub fn correlate(&self, target: &Section) -> Result<ControlPointSequence, AgeModelError> {
        let ties = self.ties(target)?;
        if ties.len() < 2 {
            return Err(AgeModelError::InsufficientControlPoints {
                context: format!(
                    "markers shared by '{}' and reference '{}'",
                    target.name, self.reference.name
                ),
                found: ties.len(),
            });
        }
        ControlPointSequence::new(ties.iter().map(BiozoneTie::control_point).collect())
    }
}

/// Ages at each marker's first appearance in an already-aged section.
///
/// Each marker's event height is snapped to the nearest sample of the same
/// section. Markers whose nearest sample has no age are skipped.
pub fn biozone_ages(section: &Section) -> Result<Vec<(String, f64)>, AgeModelError> {
    let (rows, heights) = section.present_heights();
    let mut out = Vec::new();
    for marker in section.markers() {
        let h = event_height(section, marker)?;
        let idx = nearest(&heights, h)?;
        if let Some(age) = section.samples[rows[idx]].age {
            out.push((marker.to_string(), age));
        }
    }
    Ok(out)
}

fn event_height(section: &Section, marker: &str) -> Result<f64, AgeModelError> {
    section
        .marker_row(marker)
        .and_then(|row| row.marker_height())
        .ok_or_else(|| AgeModelError::MissingEventHeight {
            section: section.name.clone(),
            marker: marker.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;
    use crate::models::PiecewiseAgeModel;

    /// Reference samples every 4 m, aged 100 - h.
    fn reference() -> Section {
        let mut samples: Vec<Sample> = (0..=5)
            .map(|i| {
                let h = 4.0 * i as f64;
                Sample::at(h).with_age(100.0 - h)
            })
            .collect();
        samples[1] = samples[1].clone().with_marker("A", 5.0);
        samples[4] = samples[4].clone().with_marker("B", 15.0);
        samples[5] = samples[5].clone().with_marker("C", 20.0);
        let mut section = Section::new("ref", samples);
        let cps = ControlPointSequence::from_pairs(&[(0.0, 100.0), (20.0, 80.0)]).unwrap();
        section.model = Some(PiecewiseAgeModel::for_heights(cps, &[0.0, 20.0]));
        section
    }

    fn target() -> Section {
        Section::new(
            "tgt",
            vec![
                Sample::at(0.0),
                Sample::at(2.0).with_marker("A", 2.0),
                Sample::at(10.0).with_marker("X", 10.0),
                Sample::at(30.0).with_marker("B", 30.0),
            ],
        )
    }

    #[test]
    fn correlation_scenario_pairs_target_heights_with_reference_ages() {
        let reference = reference();
        let cps = BiozoneCorrelator::new(&reference).correlate(&target()).unwrap();
        assert_eq!(
            cps.points(),
            &[ControlPoint::new(2.0, 96.0), ControlPoint::new(30.0, 84.0)]
        );
    }

    #[test]
    fn ties_record_nearest_reference_rows() {
        let reference = reference();
        let ties = BiozoneCorrelator::new(&reference).ties(&target()).unwrap();
        assert_eq!(ties.len(), 2);
        assert_eq!(ties[0].marker, "A");
        assert_eq!(ties[0].reference_row, 1);
        assert_eq!(ties[0].reference_height, 4.0);
        assert_eq!(ties[1].marker, "B");
        assert_eq!(ties[1].reference_row, 4);
        assert_eq!(ties[1].reference_height, 16.0);
    }

    #[test]
    fn length_equals_shared_marker_count() {
        let reference = reference();
        let target = Section::new(
            "t",
            vec![
                Sample::at(1.0).with_marker("A", 1.0),
                Sample::at(2.0).with_marker("B", 2.0),
                Sample::at(3.0).with_marker("C", 3.0),
                Sample::at(4.0).with_marker("Z", 4.0),
            ],
        );
        let correlator = BiozoneCorrelator::new(&reference);
        assert_eq!(correlator.shared_markers(&target), vec!["A", "B", "C"]);
        assert_eq!(correlator.correlate(&target).unwrap().len(), 3);
    }

    #[test]
    fn fewer_than_two_shared_markers_fails() {
        let reference = reference();
        let target = Section::new("t", vec![Sample::at(1.0).with_marker("A", 1.0), Sample::at(2.0)]);
        let err = BiozoneCorrelator::new(&reference).correlate(&target).unwrap_err();
        assert!(matches!(err, AgeModelError::InsufficientControlPoints { found: 1, .. }));
    }

    #[test]
    fn reference_without_model_fails_even_with_input_ages() {
        let mut reference = reference();
        reference.model = None;
        assert!(reference.has_ages());
        let err = BiozoneCorrelator::new(&reference).correlate(&target()).unwrap_err();
        assert_eq!(
            err,
            AgeModelError::ReferenceNotBuilt {
                reference: "ref".to_string()
            }
        );
    }

    #[test]
    fn allow_list_restricts_markers() {
        let reference = reference();
        let allowed = vec!["B".to_string(), "C".to_string()];
        let target = Section::new(
            "t",
            vec![
                Sample::at(1.0).with_marker("A", 1.0),
                Sample::at(2.0).with_marker("B", 2.0),
                Sample::at(3.0).with_marker("C", 3.0),
            ],
        );
        let correlator = BiozoneCorrelator::new(&reference).with_markers(Some(allowed.as_slice()));
        let cps = correlator.correlate(&target).unwrap();
        assert_eq!(cps.first().height, 2.0);
        assert_eq!(cps.len(), 2);
    }

    #[test]
    fn out_of_order_markers_are_rejected() {
        let reference = reference();
        let target = Section::new(
            "t",
            vec![
                Sample::at(1.0).with_marker("B", 9.0),
                Sample::at(2.0).with_marker("A", 3.0),
            ],
        );
        let err = BiozoneCorrelator::new(&reference).correlate(&target).unwrap_err();
        assert!(matches!(err, AgeModelError::NonMonotonicControlPoints { .. }));
    }

    #[test]
    fn biozone_ages_read_nearest_sample() {
        let ages = biozone_ages(&reference()).unwrap();
        assert_eq!(
            ages,
            vec![
                ("A".to_string(), 96.0),
                ("B".to_string(), 84.0),
                ("C".to_string(), 80.0)
            ]
        );
    }
}
