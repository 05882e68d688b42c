//! Monte-Carlo estimation of hiatus duration.
//!
//! Responsibilities:
//!
//! - describe and sample uncertain heights of dated horizons (`distribution`)
//! - age the sections on either side of a gap for each draw, in parallel,
//!   and summarize the resulting hiatus distribution (`estimator`)

pub mod distribution;
pub mod estimator;

pub use distribution::*;
pub use estimator::*;
