//! In-memory store of named sections.
//!
//! Sections keep their insertion order (the configured order), which is also
//! the order `build_all` processes and reports them in.

use crate::domain::Section;
use crate::error::AgeModelError;

#[derive(Debug, Clone)]
pub struct SectionStore {
    reference: String,
    sections: Vec<Section>,
}

impl SectionStore {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            sections: Vec::new(),
        }
    }

    /// Insert a section, replacing any existing section with the same name in place.
    pub fn insert(&mut self, section: Section) {
        match self.sections.iter_mut().find(|s| s.name == section.name) {
            Some(slot) => *slot = section,
            None => self.sections.push(section),
        }
    }

    pub fn reference_name(&self) -> &str {
        &self.reference
    }

    pub fn reference(&self) -> Result<&Section, AgeModelError> {
        self.get(&self.reference)
    }

    pub fn get(&self, name: &str) -> Result<&Section, AgeModelError> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AgeModelError::UnknownSection(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Section, AgeModelError> {
        self.sections
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| AgeModelError::UnknownSection(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
