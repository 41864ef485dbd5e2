//! Valuation domain models.
//!
//! `Decimal` fields serialize as decimal strings; `price` is the one numeric
//! field the wire format carries as a plain number.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A derived position for one symbol. Never stored; recomputed from the
/// ledger on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    /// Held quantity after replaying the ledger; never negative.
    pub quantity: Decimal,
    /// Cost basis per unit. `None` once the position is fully closed.
    pub avg_cost: Option<Decimal>,
    /// Remaining cost basis. `None` once the position is fully closed.
    pub cost_value: Option<Decimal>,
    /// Current market price; 0 when no price is known for the symbol.
    pub price: f64,
    /// quantity * price.
    pub value: Decimal,
    /// Paper profit on the held quantity. `None` once fully closed.
    pub unrealized_pnl: Option<Decimal>,
    /// Cumulative profit locked in by sells of this symbol.
    pub realized_pnl: Decimal,
}

/// Element-wise sums over all emitted positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationTotals {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
}

/// Data-quality warnings collected while replaying the ledger.
///
/// Each symbol appears at most once per warning kind, however many times it
/// triggered. The whole object is omitted when both lists are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationWarnings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_tx_prices: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oversold: Option<Vec<String>>,
}

impl ValuationWarnings {
    pub fn is_empty(&self) -> bool {
        self.missing_tx_prices.is_none() && self.oversold.is_none()
    }
}

/// Output of the average-cost calculator: positions sorted descending by
/// current value (symbol ascending on ties), their totals, and any warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvgCostResult {
    pub positions: Vec<Position>,
    pub totals: ValuationTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<ValuationWarnings>,
}
