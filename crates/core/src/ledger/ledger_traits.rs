//! Repository traits for ledger data.
//!
//! Raw record persistence is owned by the write path; the engine consumes it
//! through these read-only seams.

use async_trait::async_trait;

use super::{LedgerTransaction, Portfolio};
use crate::errors::Result;

/// Read access to portfolio headers.
#[async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    /// Fetch a portfolio by id. `None` when it does not exist (or was
    /// deleted since the caller last saw it).
    async fn get(&self, portfolio_id: &str) -> Result<Option<Portfolio>>;
}

/// Read access to a portfolio's transaction ledger.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// All transactions for the portfolio, ordered by ascending timestamp.
    async fn list_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<LedgerTransaction>>;
}
