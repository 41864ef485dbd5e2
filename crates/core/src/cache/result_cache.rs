//! Cached valuation results.
//!
//! Owns key naming and (de)serialization for the two cached payloads and
//! guarantees they are written together atomically, so readers never observe
//! a summary from one recompute next to positions from another.

use std::sync::Arc;

use log::warn;

use crate::cache::{CacheStoreTrait, CacheWrite};
use crate::constants::{POSITIONS_CACHE_TTL_SECS, SUMMARY_CACHE_TTL_SECS};
use crate::errors::Result;
use crate::summary::{PortfolioSummary, PositionsPayload};

pub fn summary_key(portfolio_id: &str) -> String {
    format!("portfolio:summary:{}", portfolio_id)
}

pub fn positions_key(portfolio_id: &str) -> String {
    format!("portfolio:positions:{}", portfolio_id)
}

#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStoreTrait>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStoreTrait>) -> Self {
        Self { store }
    }

    pub async fn get_summary(&self, portfolio_id: &str) -> Result<Option<PortfolioSummary>> {
        let raw = self.store.get(&summary_key(portfolio_id)).await?;
        Ok(raw.and_then(|s| parse_cached(portfolio_id, "summary", &s)))
    }

    pub async fn get_positions(&self, portfolio_id: &str) -> Result<Option<PositionsPayload>> {
        let raw = self.store.get(&positions_key(portfolio_id)).await?;
        Ok(raw.and_then(|s| parse_cached(portfolio_id, "positions", &s)))
    }

    /// Atomically publish both payloads for the portfolio.
    pub async fn publish(
        &self,
        portfolio_id: &str,
        summary: &PortfolioSummary,
        positions: &PositionsPayload,
    ) -> Result<()> {
        let writes = [
            CacheWrite {
                key: summary_key(portfolio_id),
                value: serde_json::to_string(summary)?,
                ttl_seconds: SUMMARY_CACHE_TTL_SECS,
            },
            CacheWrite {
                key: positions_key(portfolio_id),
                value: serde_json::to_string(positions)?,
                ttl_seconds: POSITIONS_CACHE_TTL_SECS,
            },
        ];
        self.store.set_many(&writes).await?;
        Ok(())
    }
}

/// A corrupt cached payload is treated as a miss, not an error: the read
/// path falls through to the cold-start recompute and the entry gets
/// overwritten by the next publish.
fn parse_cached<T: serde::de::DeserializeOwned>(
    portfolio_id: &str,
    what: &str,
    raw: &str,
) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(
                "Discarding unparseable cached {} for portfolio {}: {}",
                what, portfolio_id, e
            );
            None
        }
    }
}
