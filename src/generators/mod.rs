//! Output name generators.

pub mod target;
