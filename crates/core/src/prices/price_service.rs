//! Latest-price lookups with a durable fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use num_traits::ToPrimitive;

use crate::cache::CacheStoreTrait;
use crate::errors::Result;
use crate::prices::{
    prices_latest_key, CachedLatestPrices, LatestPrices, PriceHistoryRepositoryTrait, PriceOracleTrait,
    PriceSource,
};

/// Price oracle backed by the shared snapshot the ingestion job maintains,
/// falling back to per-asset durable ticks when the snapshot is absent.
#[derive(Clone)]
pub struct PriceService {
    store: Arc<dyn CacheStoreTrait>,
    history: Arc<dyn PriceHistoryRepositoryTrait>,
}

impl PriceService {
    pub fn new(
        store: Arc<dyn CacheStoreTrait>,
        history: Arc<dyn PriceHistoryRepositoryTrait>,
    ) -> Self {
        Self { store, history }
    }

    async fn latest_from_history(&self, symbols: &[String], currency: &str) -> Result<LatestPrices> {
        let mut prices = HashMap::new();
        let mut as_of = None;

        // One lookup per symbol; callers only pass symbols actually held.
        for symbol in symbols {
            let Some(tick) = self.history.latest_tick(symbol, currency).await? else {
                continue;
            };
            match tick.price.to_f64() {
                Some(price) => {
                    prices.insert(symbol.clone(), price);
                    as_of.get_or_insert(tick.at);
                }
                None => warn!(
                    "Durable price for {} in {} does not fit an f64; skipping",
                    symbol, currency
                ),
            }
        }

        Ok(LatestPrices {
            source: PriceSource::Durable,
            as_of,
            prices,
        })
    }
}

#[async_trait]
impl PriceOracleTrait for PriceService {
    async fn latest(&self, symbols: &[String], currency: &str) -> Result<LatestPrices> {
        if symbols.is_empty() {
            return Ok(LatestPrices {
                source: PriceSource::Cache,
                as_of: None,
                prices: HashMap::new(),
            });
        }

        let key = prices_latest_key(currency);
        if let Some(raw) = self.store.get(&key).await? {
            match serde_json::from_str::<CachedLatestPrices>(&raw) {
                Ok(snapshot) => {
                    let prices = symbols
                        .iter()
                        .filter_map(|s| snapshot.prices.get(s).map(|p| (s.clone(), *p)))
                        .collect();
                    return Ok(LatestPrices {
                        source: PriceSource::Cache,
                        as_of: Some(snapshot.at),
                        prices,
                    });
                }
                Err(e) => {
                    warn!(
                        "Discarding unparseable price snapshot at {}: {}. Falling back to history.",
                        key, e
                    );
                }
            }
        } else {
            debug!("No cached price snapshot at {}; reading durable history", key);
        }

        self.latest_from_history(symbols, currency).await
    }
}
