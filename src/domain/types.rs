//! Shared domain types.
//!
//! These are the values that flow between ingest, the age-model core and the
//! report/export layers:
//!
//! - `ControlPoint` / `ControlPointSequence`: validated (height, age) anchors
//! - `Sample` / `Section`: per-section sample tables
//! - `SedimentationRate`: diagnostics derived from a control-point sequence

use serde::{Deserialize, Serialize};

use crate::error::AgeModelError;
use crate::models::PiecewiseAgeModel;

/// A fixed (height, age) correspondence used as an interpolation anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub height: f64,
    pub age: f64,
}

impl ControlPoint {
    pub fn new(height: f64, age: f64) -> Self {
        Self { height, age }
    }
}

/// An ordered list of at least two control points with strictly increasing height.
///
/// The invariant is checked on construction, so anything holding a
/// `ControlPointSequence` can partition heights without re-validating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPointSequence {
    points: Vec<ControlPoint>,
}

impl ControlPointSequence {
    pub fn new(points: Vec<ControlPoint>) -> Result<Self, AgeModelError> {
        if points.len() < 2 {
            return Err(AgeModelError::InsufficientControlPoints {
                context: "control point sequence".to_string(),
                found: points.len(),
            });
        }
        for (index, pair) in points.windows(2).enumerate() {
            // `!(a < b)` rather than `a >= b` so NaN heights are rejected too.
            if !(pair[0].height < pair[1].height) {
                return Err(AgeModelError::NonMonotonicControlPoints {
                    index: index + 1,
                    previous: pair[0].height,
                    height: pair[1].height,
                });
            }
        }
        Ok(Self { points })
    }

    /// Build from `(height, age)` tuples.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, AgeModelError> {
        Self::new(pairs.iter().map(|&(h, a)| ControlPoint::new(h, a)).collect())
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the sequence holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> ControlPoint {
        self.points[0]
    }

    pub fn last(&self) -> ControlPoint {
        self.points[self.points.len() - 1]
    }

    /// Age change per unit height between each adjacent pair of control points.
    pub fn sedimentation_rates(&self) -> Vec<SedimentationRate> {
        self.points
            .windows(2)
            .map(|pair| SedimentationRate {
                from_height: pair[0].height,
                to_height: pair[1].height,
                rate: (pair[1].age - pair[0].age) / (pair[1].height - pair[0].height),
            })
            .collect()
    }
}

impl<'de> Deserialize<'de> for ControlPointSequence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<ControlPoint>::deserialize(deserializer)?;
        ControlPointSequence::new(points).map_err(serde::de::Error::custom)
    }
}

/// Slope of one control-point interval (`Δage / Δheight`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SedimentationRate {
    pub from_height: f64,
    pub to_height: f64,
    pub rate: f64,
}

/// One row of a section's sample table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    /// Stratigraphic height. Absent when the source cell was empty or unparseable.
    pub height: Option<f64>,
    /// Values aligned with `Section::measurement_columns`.
    pub measurements: Vec<Option<f64>>,
    /// Marker taxon whose first appearance this row records.
    pub marker: Option<String>,
    /// Height of the first appearance; often equal to `height`.
    pub event_height: Option<f64>,
    /// Age assigned by the model.
    pub age: Option<f64>,
}

impl Sample {
    pub fn at(height: f64) -> Self {
        Self {
            height: Some(height),
            ..Self::default()
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>, event_height: f64) -> Self {
        self.marker = Some(marker.into());
        self.event_height = Some(event_height);
        self
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    /// Height at which this row's marker first appears.
    ///
    /// Falls back to the sample height when no explicit event height was recorded.
    pub fn marker_height(&self) -> Option<f64> {
        self.event_height.or(self.height)
    }
}

/// A named, ordered collection of samples.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub name: String,
    pub measurement_columns: Vec<String>,
    pub samples: Vec<Sample>,
    /// Model that produced the current ages, if any.
    pub model: Option<PiecewiseAgeModel>,
}

impl Section {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            measurement_columns: Vec::new(),
            samples,
            model: None,
        }
    }

    /// Row indices and heights of every sample that has a height, in row order.
    pub fn present_heights(&self) -> (Vec<usize>, Vec<f64>) {
        self.samples
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| s.height.map(|h| (idx, h)))
            .unzip()
    }

    /// `(min, max)` over present heights, or `None` if no sample has a height.
    pub fn height_range(&self) -> Option<(f64, f64)> {
        let mut min_h = f64::INFINITY;
        let mut max_h = f64::NEG_INFINITY;
        for h in self.samples.iter().filter_map(|s| s.height) {
            min_h = min_h.min(h);
            max_h = max_h.max(h);
        }
        if min_h.is_finite() && max_h.is_finite() {
            Some((min_h, max_h))
        } else {
            None
        }
    }

    /// `(min, max)` over assigned ages.
    pub fn age_range(&self) -> Option<(f64, f64)> {
        let mut min_a = f64::INFINITY;
        let mut max_a = f64::NEG_INFINITY;
        for a in self.samples.iter().filter_map(|s| s.age) {
            min_a = min_a.min(a);
            max_a = max_a.max(a);
        }
        if min_a.is_finite() && max_a.is_finite() {
            Some((min_a, max_a))
        } else {
            None
        }
    }

    pub fn has_ages(&self) -> bool {
        self.samples.iter().any(|s| s.age.is_some())
    }

    /// Marker labels in row order, first occurrence only.
    pub fn markers(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for label in self.samples.iter().filter_map(|s| s.marker.as_deref()) {
            if !out.contains(&label) {
                out.push(label);
            }
        }
        out
    }

    /// First row carrying `marker`.
    pub fn marker_row(&self, marker: &str) -> Option<&Sample> {
        self.samples.iter().find(|s| s.marker.as_deref() == Some(marker))
    }

    /// Overwrite ages row by row; `None` clears the age.
    pub fn set_ages(&mut self, ages: &[Option<f64>]) {
        for (sample, age) in self.samples.iter_mut().zip(ages) {
            sample.age = *age;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_rejects_fewer_than_two_points() {
        let err = ControlPointSequence::from_pairs(&[(0.0, 100.0)]).unwrap_err();
        assert!(matches!(err, AgeModelError::InsufficientControlPoints { found: 1, .. }));
    }

    #[test]
    fn sequence_rejects_non_increasing_heights() {
        let err = ControlPointSequence::from_pairs(&[(0.0, 100.0), (10.0, 90.0), (10.0, 80.0)]).unwrap_err();
        assert_eq!(
            err,
            AgeModelError::NonMonotonicControlPoints {
                index: 2,
                previous: 10.0,
                height: 10.0
            }
        );

        let err = ControlPointSequence::from_pairs(&[(5.0, 1.0), (f64::NAN, 2.0)]).unwrap_err();
        assert!(matches!(err, AgeModelError::NonMonotonicControlPoints { index: 1, .. }));
    }

    #[test]
    fn sedimentation_rates_are_age_per_height() {
        let seq = ControlPointSequence::from_pairs(&[(0.0, 100.0), (10.0, 90.0), (20.0, 70.0)]).unwrap();
        let rates = seq.sedimentation_rates();
        assert_eq!(rates.len(), 2);
        assert!((rates[0].rate + 1.0).abs() < 1e-12);
        assert!((rates[1].rate + 2.0).abs() < 1e-12);
        assert_eq!(rates[1].from_height, 10.0);
    }

    #[test]
    fn sequence_deserialize_validates() {
        let ok: ControlPointSequence =
            serde_json::from_str(r#"[{"height": 1.0, "age": 5.0}, {"height": 2.0, "age": 4.0}]"#).unwrap();
        assert_eq!(ok.len(), 2);

        let bad = serde_json::from_str::<ControlPointSequence>(
            r#"[{"height": 2.0, "age": 5.0}, {"height": 1.0, "age": 4.0}]"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn section_helpers_skip_absent_values() {
        let mut section = Section::new(
            "s",
            vec![
                Sample::at(1.0).with_marker("A", 1.5),
                Sample::default(),
                Sample::at(3.0).with_marker("B", 3.0),
                Sample::at(4.0).with_marker("A", 4.0),
            ],
        );
        let (idx, heights) = section.present_heights();
        assert_eq!(idx, vec![0, 2, 3]);
        assert_eq!(heights, vec![1.0, 3.0, 4.0]);
        assert_eq!(section.height_range(), Some((1.0, 4.0)));
        assert_eq!(section.markers(), vec!["A", "B"]);
        assert_eq!(section.marker_row("A").and_then(Sample::marker_height), Some(1.5));
        assert!(!section.has_ages());

        section.set_ages(&[Some(10.0), None, Some(8.0), Some(7.0)]);
        assert!(section.has_ages());
        assert_eq!(section.age_range(), Some((7.0, 10.0)));
    }
}
