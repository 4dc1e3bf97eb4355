//! Core business logic modules.

pub mod border;
pub mod cache;
pub mod catalogue;
pub mod gc;
pub mod matcher;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod scheduler;
pub mod search_index;
pub mod sync;
pub mod unmatched;
