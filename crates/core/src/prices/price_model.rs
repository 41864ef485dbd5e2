//! Price domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a batch of latest prices came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// The shared snapshot maintained by the ingestion job.
    Cache,
    /// Per-asset latest ticks read from durable history.
    Durable,
}

/// Latest known prices for a set of symbols. Unknown symbols are simply
/// omitted from `prices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestPrices {
    pub source: PriceSource,
    pub as_of: Option<DateTime<Utc>>,
    pub prices: HashMap<String, f64>,
}

/// Shape of the shared `prices:latest:{CURRENCY}` snapshot written by the
/// (out of scope) market-price ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLatestPrices {
    pub at: DateTime<Utc>,
    pub prices: HashMap<String, f64>,
}

/// One durable price point for an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    pub symbol: String,
    pub currency: String,
    pub price: Decimal,
    pub at: DateTime<Utc>,
}

pub fn prices_latest_key(currency: &str) -> String {
    format!("prices:latest:{}", currency.to_uppercase())
}
