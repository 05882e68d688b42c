//! Project config loading.
//!
//! The config path is taken from `--config` when given, else from the
//! `STRAT_AGE_CONFIG` environment variable (a `.env` file in the working
//! directory is honoured). Relative `data_dir` values are resolved against the
//! directory holding the config file.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::ProjectConfig;
use crate::error::AppError;

pub const CONFIG_ENV: &str = "STRAT_AGE_CONFIG";

/// A validated config plus the directory its relative paths hang off.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub base_dir: PathBuf,
    pub config: ProjectConfig,
}

/// Resolve the config path from the CLI flag or the environment.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(p) = cli_path {
        return Ok(p.to_path_buf());
    }

    // Load .env if present (ignore if missing).
    let _ = dotenvy::dotenv();

    match std::env::var(CONFIG_ENV) {
        Ok(v) if !v.trim().is_empty() => Ok(PathBuf::from(v.trim())),
        _ => Err(AppError::new(
            2,
            format!("No project config given. Pass --config <file> or set {CONFIG_ENV}."),
        )),
    }
}

/// Read, parse and validate a project config.
pub fn load_config(path: &Path) -> Result<LoadedConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
    let config: ProjectConfig = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))?;
    config.validate()?;

    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    log::info!(
        "config '{}': {} sections, reference '{}'",
        path.display(),
        config.sections.len(),
        config.reference_section
    );

    Ok(LoadedConfig {
        path: path.to_path_buf(),
        base_dir,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strat-age-config-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_and_validates() {
        let dir = temp_dir("ok");
        let path = dir.join("project.json");
        std::fs::write(
            &path,
            r#"{
                "data_dir": "csv",
                "sections": [{"name": "mill", "file": "mill.csv"}],
                "reference_section": "mill",
                "reference_control_points": [{"height": 0.0, "age": 100.0}, {"height": 10.0, "age": 90.0}]
            }"#,
        )
        .unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.base_dir, dir);
        assert_eq!(loaded.config.data_dir, PathBuf::from("csv"));
        assert_eq!(loaded.config.columns.height, "samp_height");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn invalid_config_is_an_input_error() {
        let dir = temp_dir("bad");
        let path = dir.join("project.json");
        std::fs::write(
            &path,
            r#"{
                "sections": [{"name": "mill", "file": "mill.csv"}],
                "reference_section": "other",
                "reference_control_points": [{"height": 0.0, "age": 100.0}, {"height": 10.0, "age": 90.0}]
            }"#,
        )
        .unwrap();
        assert_eq!(load_config(&path).unwrap_err().exit_code(), 2);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path).unwrap_err().exit_code(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn explicit_path_wins() {
        let p = resolve_config_path(Some(Path::new("a/b.json"))).unwrap();
        assert_eq!(p, PathBuf::from("a/b.json"));
    }
}
