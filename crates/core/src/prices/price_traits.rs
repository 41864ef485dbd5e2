//! Price oracle and history traits.

use async_trait::async_trait;

use super::{LatestPrices, PriceTick};
use crate::errors::Result;

/// Supplies the latest known price per symbol in a given currency.
///
/// Implementations must tolerate unknown symbols (omit them, never error)
/// and an empty symbol set (empty prices, no as-of timestamp).
#[async_trait]
pub trait PriceOracleTrait: Send + Sync {
    async fn latest(&self, symbols: &[String], currency: &str) -> Result<LatestPrices>;
}

/// Read access to durable per-asset price history. Fallback source when the
/// shared snapshot is absent.
#[async_trait]
pub trait PriceHistoryRepositoryTrait: Send + Sync {
    /// The most recent tick for the symbol in the currency, if any.
    async fn latest_tick(&self, symbol: &str, currency: &str) -> Result<Option<PriceTick>>;
}
