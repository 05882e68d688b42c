//! Piecewise-linear age model.
//!
//! One linear segment per adjacent pair of control points. Heights are
//! partitioned as follows (N control points, N-1 segments):
//!
//! - segment `i` covers `[h_i, h_{i+1})`
//! - the first segment's lower bound is pushed down to the lowest evaluated
//!   sample height, so samples below the first control point extrapolate
//!   along the first segment's line
//! - the last segment's upper bound is pushed up to the highest evaluated
//!   sample height and is closed, so samples above the last control point
//!   extrapolate along the last segment's line
//!
//! Every height in `[lower, upper]` therefore maps to exactly one segment. A
//! height outside that range is an `OutOfDomain` error, which means the bounds
//! were computed from a different sample set than the one being evaluated.

use serde::Serialize;

use crate::domain::{ControlPoint, ControlPointSequence};
use crate::error::AgeModelError;

/// A straight line through two control points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearSegment {
    pub start: ControlPoint,
    pub end: ControlPoint,
}

impl LinearSegment {
    /// `Δage / Δheight`.
    pub fn slope(&self) -> f64 {
        (self.end.age - self.start.age) / (self.end.height - self.start.height)
    }

    /// Affine interpolation/extrapolation through the two anchors.
    ///
    /// Written as a weighted sum so that `evaluate(start.height) == start.age`
    /// and `evaluate(end.height) == end.age` hold bit-for-bit.
    pub fn evaluate(&self, height: f64) -> f64 {
        let u = (height - self.start.height) / (self.end.height - self.start.height);
        self.start.age * (1.0 - u) + self.end.age * u
    }
}

/// Height range the model partitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeightDomain {
    pub lower: f64,
    pub upper: f64,
}

impl HeightDomain {
    /// Extent of a set of heights, ignoring NaN. `None` if nothing is finite.
    pub fn from_heights(heights: &[f64]) -> Option<Self> {
        let mut lower = f64::INFINITY;
        let mut upper = f64::NEG_INFINITY;
        for &h in heights.iter().filter(|h| h.is_finite()) {
            lower = lower.min(h);
            upper = upper.max(h);
        }
        if lower.is_finite() && upper.is_finite() {
            Some(Self { lower, upper })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PiecewiseAgeModel {
    control_points: ControlPointSequence,
    segments: Vec<LinearSegment>,
    domain: HeightDomain,
}

impl PiecewiseAgeModel {
    /// Build a model covering `sample_domain` as well as the control points themselves.
    ///
    /// The outer bounds are `min(sample lower, first control height)` and
    /// `max(sample upper, last control height)`.
    pub fn build(control_points: ControlPointSequence, sample_domain: Option<HeightDomain>) -> Self {
        let segments: Vec<LinearSegment> = control_points
            .points()
            .windows(2)
            .map(|pair| LinearSegment {
                start: pair[0],
                end: pair[1],
            })
            .collect();

        let mut domain = HeightDomain {
            lower: control_points.first().height,
            upper: control_points.last().height,
        };
        if let Some(samples) = sample_domain {
            domain.lower = domain.lower.min(samples.lower);
            domain.upper = domain.upper.max(samples.upper);
        }

        Self {
            control_points,
            segments,
            domain,
        }
    }

    /// Build a model bounded by the extent of `heights`.
    pub fn for_heights(control_points: ControlPointSequence, heights: &[f64]) -> Self {
        Self::build(control_points, HeightDomain::from_heights(heights))
    }

    pub fn control_points(&self) -> &ControlPointSequence {
        &self.control_points
    }

    pub fn segments(&self) -> &[LinearSegment] {
        &self.segments
    }

    pub fn domain(&self) -> HeightDomain {
        self.domain
    }

    /// Index of the unique segment whose domain contains `height`.
    pub fn segment_index(&self, height: f64) -> Result<usize, AgeModelError> {
        if !(height >= self.domain.lower && height <= self.domain.upper) {
            return Err(AgeModelError::OutOfDomain {
                height,
                lower: self.domain.lower,
                upper: self.domain.upper,
            });
        }
        // Interior breakpoints are the start heights of segments 1..N-1. A
        // height equal to a breakpoint belongs to the segment that starts there.
        let interior = &self.segments[1..];
        Ok(interior.partition_point(|s| s.start.height <= height))
    }

    /// Age at a single height.
    pub fn age_at(&self, height: f64) -> Result<f64, AgeModelError> {
        let idx = self.segment_index(height)?;
        Ok(self.segments[idx].evaluate(height))
    }

    /// Ages for each height, in order.
    pub fn evaluate(&self, heights: &[f64]) -> Result<Vec<f64>, AgeModelError> {
        heights.iter().map(|&h| self.age_at(h)).collect()
    }
}
