//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - control points and validated control-point sequences
//! - samples and sections
//! - the project configuration (`ProjectConfig`, `ColumnMap`, `HiatusConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
