//! Poster Renamer Library
//!
//! Matches loosely named poster images to movies, shows, seasons and
//! collections, and syncs them into an asset library without redoing work
//! for files that have not changed.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod models;
pub mod utils;

pub use error::{Error, Result};
