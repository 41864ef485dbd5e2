//! Valuation module - the pure average-cost ledger calculator.

pub mod avg_cost_calculator;
mod valuation_model;

pub use avg_cost_calculator::*;
pub use valuation_model::*;
