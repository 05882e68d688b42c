//! Age-model orchestration.
//!
//! `AgeModelEngine` owns the section store and the reference control points.
//! Typical flow:
//!
//! 1. `build_reference_model()`: explicit reference control points -> model ->
//!    ages written into the reference section
//! 2. per other section, either
//!    - `build_from_correlation(name)`: control points derived from shared
//!      markers against the aged reference, or
//!    - `build_from_control_points(name, cps)`: caller-supplied control points
//!      (e.g. Monte-Carlo draws)
//!
//! The `build_*` operations are return-only and take `&self`, so once the
//! reference is built they can run concurrently. The `assign_*` operations
//! write the result back into the section.

use crate::correlate::BiozoneCorrelator;
use crate::data::SectionStore;
use crate::domain::{ControlPointSequence, Section};
use crate::error::AgeModelError;
use crate::models::PiecewiseAgeModel;

/// Result of evaluating one section's age model.
#[derive(Debug, Clone)]
pub struct SectionAges {
    pub section: String,
    pub model: PiecewiseAgeModel,
    /// One entry per sample row; `None` for rows without a height.
    pub ages: Vec<Option<f64>>,
}

impl SectionAges {
    pub fn control_points(&self) -> &ControlPointSequence {
        self.model.control_points()
    }

    /// Age at a row index, if that row has one.
    pub fn age_at_row(&self, row: usize) -> Option<f64> {
        self.ages.get(row).copied().flatten()
    }
}

#[derive(Debug, Clone)]
pub struct AgeModelEngine {
    store: SectionStore,
    reference_points: ControlPointSequence,
    biozones: Option<Vec<String>>,
}

impl AgeModelEngine {
    pub fn new(store: SectionStore, reference_points: ControlPointSequence) -> Self {
        Self {
            store,
            reference_points,
            biozones: None,
        }
    }

    /// Restrict correlation to the given markers (`None` or empty = all markers).
    pub fn with_biozones(mut self, biozones: Option<Vec<String>>) -> Self {
        self.biozones = biozones.filter(|b| !b.is_empty());
        self
    }

    pub fn store(&self) -> &SectionStore {
        &self.store
    }

    pub fn into_store(self) -> SectionStore {
        self.store
    }

    pub fn section(&self, name: &str) -> Result<&Section, AgeModelError> {
        self.store.get(name)
    }

    pub fn reference_points(&self) -> &ControlPointSequence {
        &self.reference_points
    }

    /// True once `build_reference_model` has run. Ages read from input files do not count.
    pub fn is_reference_built(&self) -> bool {
        self.store.reference().is_ok_and(|r| r.model.is_some())
    }

    /// Rebuild the reference model from scratch and write its ages.
    pub fn build_reference_model(&mut self) -> Result<&PiecewiseAgeModel, AgeModelError> {
        let reference = self.store.reference_name().to_string();
        let result = self.build_from_control_points(&reference, self.reference_points.clone())?;
        log::info!(
            "reference '{}' aged over {} control points",
            reference,
            result.control_points().len()
        );
        self.write_back(result)
    }

    /// Control points for `name` derived from shared markers.
    ///
    /// The reference section yields its own explicit control points. Fails
    /// with `ReferenceNotBuilt` if the reference model has not been built.
    pub fn correlate(&self, name: &str) -> Result<ControlPointSequence, AgeModelError> {
        if name == self.store.reference_name() {
            return Ok(self.reference_points.clone());
        }
        let target = self.store.get(name)?;
        let reference = self.store.reference()?;
        self.correlator(reference)
            .correlate(target)
            .map_err(|e| e.in_section(name))
    }

    /// Correlator bound to the current reference section.
    pub fn correlator<'a>(&'a self, reference: &'a Section) -> BiozoneCorrelator<'a> {
        BiozoneCorrelator::new(reference).with_markers(self.biozones.as_deref())
    }

    /// Evaluate `name` with control points from biozone correlation. Return-only.
    ///
    /// Builds the reference first if it has not been built.
    pub fn build_from_correlation(&mut self, name: &str) -> Result<SectionAges, AgeModelError> {
        if !self.is_reference_built() {
            self.build_reference_model()?;
        }
        let cps = self.correlate(name)?;
        self.build_from_control_points(name, cps)
    }

    /// Evaluate `name` with explicit control points. Return-only and side-effect free.
    pub fn build_from_control_points(
        &self,
        name: &str,
        control_points: ControlPointSequence,
    ) -> Result<SectionAges, AgeModelError> {
        let section = self.store.get(name)?;
        evaluate_section(section, control_points).map_err(|e| e.in_section(name))
    }

    /// Like `build_from_correlation`, then write ages and model into the section.
    pub fn assign_from_correlation(&mut self, name: &str) -> Result<&PiecewiseAgeModel, AgeModelError> {
        let result = self.build_from_correlation(name)?;
        self.write_back(result)
    }

    /// Like `build_from_control_points`, then write ages and model into the section.
    pub fn assign_from_control_points(
        &mut self,
        name: &str,
        control_points: ControlPointSequence,
    ) -> Result<&PiecewiseAgeModel, AgeModelError> {
        let result = self.build_from_control_points(name, control_points)?;
        self.write_back(result)
    }

    /// Build the reference, then assign every other section from correlation.
    ///
    /// Sections are processed in store order; a failing section does not stop
    /// the others and is left without ages. The reference failing does stop
    /// the run, since nothing can correlate.
    pub fn build_all(&mut self) -> Result<Vec<(String, Result<(), AgeModelError>)>, AgeModelError> {
        self.build_reference_model()?;
        let reference = self.store.reference_name().to_string();

        let names: Vec<String> = self.store.names().map(str::to_string).collect();
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            if name == reference {
                outcomes.push((name, Ok(())));
                continue;
            }
            let outcome = self.assign_from_correlation(&name).map(|_| ());
            if let Err(e) = &outcome {
                log::warn!("{e}");
                self.clear_ages(&name)?;
            }
            outcomes.push((name, outcome));
        }
        Ok(outcomes)
    }

    /// Drop ages and model from a section that could not be aged.
    fn clear_ages(&mut self, name: &str) -> Result<(), AgeModelError> {
        let section = self.store.get_mut(name)?;
        for sample in &mut section.samples {
            sample.age = None;
        }
        section.model = None;
        Ok(())
    }

    fn write_back(&mut self, result: SectionAges) -> Result<&PiecewiseAgeModel, AgeModelError> {
        let section = self.store.get_mut(&result.section)?;
        section.set_ages(&result.ages);
        let model = section.model.insert(result.model);
        Ok(model)
    }
}

/// Build a model bounded by the section's own heights and evaluate every row.
pub fn evaluate_section(section: &Section, control_points: ControlPointSequence) -> Result<SectionAges, AgeModelError> {
    let (rows, heights) = section.present_heights();
    let model = PiecewiseAgeModel::for_heights(control_points, &heights);
    let present = model.evaluate(&heights)?;

    let mut ages = vec![None; section.samples.len()];
    for (row, age) in rows.into_iter().zip(present) {
        ages[row] = Some(age);
    }

    log::debug!(
        "section '{}': {} of {} rows aged",
        section.name,
        heights.len(),
        section.samples.len()
    );

    Ok(SectionAges {
        section: section.name.clone(),
        model,
        ages,
    })
}
