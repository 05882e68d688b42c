//! Age model implementations.
//!
//! Only piecewise-linear models are supported; they are built fresh for every
//! evaluation and never updated incrementally.

pub mod piecewise;

pub use piecewise::*;
