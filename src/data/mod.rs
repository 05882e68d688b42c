//! Section storage.

pub mod store;

pub use store::*;
