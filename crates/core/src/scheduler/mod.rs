//! Scheduler module - deduplicated recompute job scheduling.

mod queue_traits;
mod recompute_scheduler;
mod scheduler_model;

pub use queue_traits::*;
pub use recompute_scheduler::*;
pub use scheduler_model::*;
