//! Summary module - cached valuation payloads and the non-blocking read path.

mod summary_model;
mod summary_service;

pub use summary_model::*;
pub use summary_service::*;
