//! Cached valuation payloads and read-path response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prices::PriceSource;
use crate::valuation::{Position, ValuationTotals, ValuationWarnings};

/// Portfolio header embedded in the cached summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRef {
    pub id: String,
    pub name: String,
    pub currency: String,
}

/// Headline valuation for a portfolio. Cached alongside `PositionsPayload`
/// and always written together with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub portfolio: PortfolioRef,
    pub prices_source: PriceSource,
    pub prices_at: Option<DateTime<Utc>>,
    /// Convenience numeric for dashboards; the exact decimal lives in
    /// `totals.total_value`.
    pub total_value: f64,
    pub holdings: Vec<Position>,
    pub totals: ValuationTotals,
    pub computed_at: DateTime<Utc>,
}

/// Full position breakdown for a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsPayload {
    pub positions: Vec<Position>,
    pub totals: ValuationTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<ValuationWarnings>,
    pub computed_at: DateTime<Utc>,
}

/// Both cached payloads in one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationSnapshot {
    pub summary: Option<PortfolioSummary>,
    pub positions: Option<PositionsPayload>,
}

/// Where a read-path response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadSource {
    Cache,
    Queue,
}

/// Non-blocking read result: cached data when present, otherwise a pending
/// marker with a polling hint while the recompute runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ValuationRead<T> {
    #[serde(rename_all = "camelCase")]
    Ready {
        source: ReadSource,
        /// True while a dirty marker exists: the data is served but a newer
        /// ledger write has not been folded in yet.
        stale: bool,
        dirty_at: Option<i64>,
        #[serde(flatten)]
        data: T,
    },
    #[serde(rename_all = "camelCase")]
    Pending {
        source: ReadSource,
        retry_after_ms: u64,
    },
}

impl<T> ValuationRead<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ValuationRead::Ready { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ValuationRead::Pending { .. })
    }
}
