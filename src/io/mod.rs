//! Input/output helpers.
//!
//! - project config loading (`config`)
//! - section CSV ingest + normalization (`ingest`)
//! - aged section CSV export (`export`)
//! - hiatus run JSON read/write (`run`)

pub mod config;
pub mod export;
pub mod ingest;
pub mod run;

pub use config::*;
pub use export::*;
pub use ingest::*;
pub use run::*;
