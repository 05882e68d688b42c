//! Numeric helpers shared by the age-model core.

pub mod nearest;

pub use nearest::*;
