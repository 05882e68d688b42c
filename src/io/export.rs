//! Export aged sections to CSV.
//!
//! One file per section, named `<section>.csv`, with the canonical height
//! column, every measurement column, the marker columns and the populated
//! age column. Absent values are written as empty cells.

use std::path::{Path, PathBuf};

use crate::domain::{ColumnMap, Section};
use crate::error::AppError;

/// Write one section to `path`.
pub fn write_section_csv(path: &Path, section: &Section, columns: &ColumnMap) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let mut header = vec![columns.height.as_str()];
    header.extend(section.measurement_columns.iter().map(String::as_str));
    header.extend([columns.marker.as_str(), columns.event_height.as_str(), columns.age.as_str()]);
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for s in &section.samples {
        let mut row = vec![fmt_opt(s.height)];
        row.extend(s.measurements.iter().map(|&v| fmt_opt(v)));
        row.push(s.marker.clone().unwrap_or_default());
        row.push(fmt_opt(s.event_height));
        row.push(fmt_opt(s.age));
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Write every section into `dir` (created if missing). Returns the written paths.
pub fn write_sections(dir: &Path, sections: &[Section], columns: &ColumnMap) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let mut written = Vec::with_capacity(sections.len());
    for section in sections {
        let path = dir.join(format!("{}.csv", section.name));
        write_section_csv(&path, section, columns)?;
        log::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
