//! Cache module - key-value store seam and the cached-valuation wrapper.

mod cache_traits;
mod result_cache;

pub use cache_traits::*;
pub use result_cache::*;
