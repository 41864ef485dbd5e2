//! Staleness module - the per-portfolio dirty-marker protocol.

mod staleness_tracker;

pub use staleness_tracker::*;
