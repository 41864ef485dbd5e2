//! Ledger module - immutable transaction records and their repositories.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::*;
pub use ledger_traits::*;
