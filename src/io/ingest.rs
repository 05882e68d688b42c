//! CSV ingest and normalization.
//!
//! Turns one spreadsheet export per section into a `Section`:
//!
//! - headers are normalized (BOM stripped, trimmed, lower-cased) and renamed
//!   through the configured `ColumnMap::rename`
//! - the canonical height / marker / event-height / age columns are picked out
//! - every other column becomes a measurement column
//!
//! Rows are kept in file order; the age model assumes they are already
//! height-ordered. Only the height column is required.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::data::SectionStore;
use crate::domain::{ColumnMap, ProjectConfig, Sample, Section};
use crate::error::AppError;

/// Summary stats about one ingested section.
#[derive(Debug, Clone)]
pub struct SectionStats {
    pub rows_read: usize,
    pub rows_with_height: usize,
    pub height_min: Option<f64>,
    pub height_max: Option<f64>,
    pub markers: usize,
}

/// A row-level note encountered during ingest (the row is still kept).
#[derive(Debug, Clone)]
pub struct RowNote {
    pub line: usize,
    pub message: String,
}

/// Ingest output for one section.
#[derive(Debug, Clone)]
pub struct IngestedSection {
    pub section: Section,
    pub stats: SectionStats,
    pub notes: Vec<RowNote>,
}

/// Ingest output for a whole project.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub store: SectionStore,
    pub reports: Vec<(String, SectionStats, Vec<RowNote>)>,
}

/// Load every configured section into a store.
///
/// `base_dir` is the directory relative paths in the config are resolved against.
pub fn load_sections(config: &ProjectConfig, base_dir: &Path) -> Result<IngestedData, AppError> {
    let data_dir = base_dir.join(&config.data_dir);
    let mut store = SectionStore::new(config.reference_section.clone());
    let mut reports = Vec::with_capacity(config.sections.len());

    for source in &config.sections {
        let path = data_dir.join(&source.file);
        let ingested = load_section_file(&source.name, &path, &config.columns)?;
        log::info!(
            "loaded section '{}' from {} ({} rows, {} markers)",
            source.name,
            path.display(),
            ingested.stats.rows_read,
            ingested.stats.markers
        );
        for note in &ingested.notes {
            log::warn!("{}:{}: {}", path.display(), note.line, note.message);
        }
        reports.push((source.name.clone(), ingested.stats, ingested.notes));
        store.insert(ingested.section);
    }

    Ok(IngestedData { store, reports })
}

/// Load one section CSV from disk.
pub fn load_section_file(name: &str, path: &Path, columns: &ColumnMap) -> Result<IngestedSection, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_section(name, file, columns)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Read one section from any CSV source.
pub fn read_section<R: Read>(name: &str, source: R, columns: &ColumnMap) -> Result<IngestedSection, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let layout = ColumnLayout::resolve(&headers, columns)?;

    let mut samples = Vec::new();
    let mut notes = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line, and lines are 1-based.
        let line = idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                return Err(AppError::new(2, format!("CSV parse error on line {line}: {e}")));
            }
        };

        let sample = layout.parse_row(&record, line, &mut notes);
        samples.push(sample);
    }

    check_height_order(&samples, &mut notes);

    let mut section = Section::new(name, samples);
    section.measurement_columns = layout.measurement_names;

    let stats = compute_stats(&section);
    Ok(IngestedSection { section, stats, notes })
}

/// Column indices resolved against one file's headers.
#[derive(Debug, Clone)]
struct ColumnLayout {
    height: usize,
    marker: Option<usize>,
    event_height: Option<usize>,
    age: Option<usize>,
    measurements: Vec<usize>,
    measurement_names: Vec<String>,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord, columns: &ColumnMap) -> Result<Self, AppError> {
        let renames: HashMap<String, String> = columns
            .rename
            .iter()
            .map(|(raw, canonical)| (normalize_header_name(raw), normalize_header_name(canonical)))
            .collect();

        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                let n = normalize_header_name(h);
                renames.get(&n).cloned().unwrap_or(n)
            })
            .collect();

        let find = |wanted: &str| {
            let wanted = normalize_header_name(wanted);
            names.iter().position(|n| *n == wanted)
        };

        let height = find(&columns.height)
            .ok_or_else(|| AppError::new(2, format!("Missing required column: `{}`", columns.height)))?;
        let marker = find(&columns.marker);
        let event_height = find(&columns.event_height);
        let age = find(&columns.age);

        let reserved = [Some(height), marker, event_height, age];
        let (measurements, measurement_names): (Vec<usize>, Vec<String>) = names
            .iter()
            .enumerate()
            .filter(|(idx, name)| !reserved.contains(&Some(*idx)) && !name.is_empty())
            .map(|(idx, name)| (idx, name.clone()))
            .unzip();

        Ok(Self {
            height,
            marker,
            event_height,
            age,
            measurements,
            measurement_names,
        })
    }

    fn parse_row(&self, record: &StringRecord, line: usize, notes: &mut Vec<RowNote>) -> Sample {
        let raw_height = get_optional(record, Some(self.height));
        let height = parse_opt_f64(raw_height);
        if let (Some(raw), None) = (raw_height, height) {
            notes.push(RowNote {
                line,
                message: format!("Unparseable height '{raw}'; row kept without a height."),
            });
        }

        let marker = get_optional(record, self.marker).map(str::to_string);
        let event_height = parse_opt_f64(get_optional(record, self.event_height));
        let age = parse_opt_f64(get_optional(record, self.age));
        let measurements = self
            .measurements
            .iter()
            .map(|&idx| parse_opt_f64(get_optional(record, Some(idx))))
            .collect();

        Sample {
            height,
            measurements,
            marker,
            event_height,
            age,
        }
    }
}

fn check_height_order(samples: &[Sample], notes: &mut Vec<RowNote>) {
    let mut prev: Option<f64> = None;
    for (idx, h) in samples.iter().enumerate().filter_map(|(i, s)| s.height.map(|h| (i, h))) {
        if let Some(p) = prev {
            if h < p {
                notes.push(RowNote {
                    line: idx + 2,
                    message: format!("Height {h} is below the previous height {p}; rows are assumed height-ordered."),
                });
            }
        }
        prev = Some(h);
    }
}

fn compute_stats(section: &Section) -> SectionStats {
    let range = section.height_range();
    SectionStats {
        rows_read: section.samples.len(),
        rows_with_height: section.samples.iter().filter(|s| s.height.is_some()).count(),
        height_min: range.map(|r| r.0),
        height_max: range.map(|r| r.1),
        markers: section.markers().len(),
    }
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the height column goes missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_optional(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    record.get(idx?).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
