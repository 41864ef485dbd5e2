//! Average-cost replay of a portfolio ledger.
//!
//! This is a total, pure function: it performs no I/O, never fails on
//! malformed economic input, and degrades every anomaly (missing price,
//! oversell) to zero-substitution plus a warning.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::ledger::{LedgerTransaction, TransactionKind};
use crate::valuation::{AvgCostResult, Position, ValuationTotals, ValuationWarnings};

#[derive(Debug, Default)]
struct SymbolState {
    qty: Decimal,
    cost: Decimal,
    realized: Decimal,
    missing_price: bool,
    oversold: bool,
}

/// Replays `txs` (ordered by ascending timestamp) against `latest_prices`
/// and returns positions, totals, and warnings.
///
/// All arithmetic is exact decimal; current prices arrive as plain numbers
/// and are converted at the valuation step. Division uses rust_decimal's
/// default 28-digit midpoint-nearest-even behavior with no intermediate
/// rounding.
pub fn calculate_positions_average_cost(
    txs: &[LedgerTransaction],
    latest_prices: &HashMap<String, f64>,
) -> AvgCostResult {
    // BTreeMap keeps replay output deterministic for identical ledgers.
    let mut state: BTreeMap<&str, SymbolState> = BTreeMap::new();

    for tx in txs {
        let st = state.entry(tx.symbol.as_str()).or_default();

        if tx.price.is_none() {
            st.missing_price = true;
        }
        let price = tx.price.unwrap_or(Decimal::ZERO);

        match tx.kind {
            TransactionKind::Buy => {
                st.qty += tx.quantity;
                st.cost += tx.quantity * price;
            }
            TransactionKind::Sell => {
                let avg = if st.qty > Decimal::ZERO {
                    st.cost / st.qty
                } else {
                    Decimal::ZERO
                };

                let mut sell_qty = tx.quantity;
                if sell_qty > st.qty {
                    // Excess sale quantity is discarded, not carried as a short.
                    st.oversold = true;
                    sell_qty = st.qty;
                }
                if sell_qty <= Decimal::ZERO {
                    continue;
                }

                let cost_basis_sold = avg * sell_qty;
                let proceeds = price * sell_qty;

                st.realized += proceeds - cost_basis_sold;
                st.qty -= sell_qty;
                st.cost -= cost_basis_sold;

                if st.qty <= Decimal::ZERO {
                    // Reset exactly to zero so rounding drift cannot survive
                    // a full close.
                    st.qty = Decimal::ZERO;
                    st.cost = Decimal::ZERO;
                }
            }
        }
    }

    let mut missing_tx_prices: Vec<String> = Vec::new();
    let mut oversold: Vec<String> = Vec::new();

    let mut total_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut unrealized_pnl = Decimal::ZERO;
    let mut realized_pnl = Decimal::ZERO;

    // A symbol is emitted iff it is still held or it realized a nonzero
    // gain/loss; fully-closed break-even symbols disappear, warnings included.
    let mut positions: Vec<Position> = state
        .iter()
        .filter(|(_, st)| st.qty > Decimal::ZERO || st.realized != Decimal::ZERO)
        .map(|(sym, st)| {
            if st.missing_price {
                missing_tx_prices.push((*sym).to_string());
            }
            if st.oversold {
                oversold.push((*sym).to_string());
            }

            let price_now = latest_prices.get(*sym).copied().unwrap_or(0.0);
            let price_now_dec = Decimal::from_f64_retain(price_now).unwrap_or(Decimal::ZERO);
            let value = st.qty * price_now_dec;

            let held = st.qty > Decimal::ZERO;
            let avg_cost = if held { Some(st.cost / st.qty) } else { None };
            let u_pnl = if held { Some(value - st.cost) } else { None };

            total_value += value;
            total_cost += st.cost;
            realized_pnl += st.realized;
            if let Some(u) = u_pnl {
                unrealized_pnl += u;
            }

            Position {
                symbol: (*sym).to_string(),
                quantity: st.qty,
                avg_cost,
                cost_value: if held { Some(st.cost) } else { None },
                price: price_now,
                value,
                unrealized_pnl: u_pnl,
                realized_pnl: st.realized,
            }
        })
        .collect();

    // Largest positions first; symbol ascending stabilizes equal values.
    positions.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.symbol.cmp(&b.symbol)));

    let warnings = if missing_tx_prices.is_empty() && oversold.is_empty() {
        None
    } else {
        Some(ValuationWarnings {
            missing_tx_prices: (!missing_tx_prices.is_empty()).then_some(missing_tx_prices),
            oversold: (!oversold.is_empty()).then_some(oversold),
        })
    };

    AvgCostResult {
        positions,
        totals: ValuationTotals {
            total_value,
            total_cost,
            unrealized_pnl,
            realized_pnl,
        },
        warnings,
    }
}
