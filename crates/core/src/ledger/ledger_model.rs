//! Ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of a ledger transaction.
///
/// Modeled as a two-case tagged variant so the calculator stays a pure data
/// transformation over the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
}

/// A single buy/sell entry in a portfolio's ledger.
///
/// Transactions are immutable once created. Replay order is ascending `at`;
/// the average-cost calculation is order-sensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub id: String,
    pub kind: TransactionKind,
    pub symbol: String,
    /// Strictly positive; validated by the write path before the ledger
    /// record is created.
    pub quantity: Decimal,
    /// Unit price in the portfolio's base currency. Absent prices degrade to
    /// zero-cost accounting with a warning, never an error.
    pub price: Option<Decimal>,
    pub at: DateTime<Utc>,
}

/// A portfolio header. Ownership and persistence of the full record are the
/// write path's concern; the engine only needs identity and currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub name: String,
    /// Opaque uppercase currency tag (e.g. "USD"). No conversion logic.
    pub base_currency: String,
}
