//! `strat-age` library crate.
//!
//! Piecewise-linear depth-to-age models for stratigraphic sections: a
//! reference section is aged from dated control points, other sections are
//! tied to it through shared biozone markers, and hiatuses between stacked
//! sections are estimated by Monte-Carlo.
//!
//! The binary (`strat-age`) is a thin wrapper around this library so the core
//! logic is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod correlate;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod hiatus;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
