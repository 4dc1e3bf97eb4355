//! CLI command implementations.

pub mod cache;
pub mod clean;
pub mod matching;
pub mod run;
