//! Worker module - drives one recompute job to completion.

mod recompute_worker;

pub use recompute_worker::*;
