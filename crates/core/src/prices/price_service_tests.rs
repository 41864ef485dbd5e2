#[cfg(test)]
mod tests {
    use crate::cache::{CacheStoreTrait, CacheWrite};
    use crate::errors::{CacheError, Result};
    use crate::prices::{
        prices_latest_key, PriceHistoryRepositoryTrait, PriceOracleTrait, PriceService, PriceSource,
        PriceTick,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // --- Mock CacheStore ---
    #[derive(Default)]
    struct MockCacheStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl CacheStoreTrait for MockCacheStore {
        async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: &str,
            _ttl_seconds: u64,
        ) -> std::result::Result<(), CacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn set_many(&self, writes: &[CacheWrite]) -> std::result::Result<(), CacheError> {
            let mut entries = self.entries.lock().unwrap();
            for w in writes {
                entries.insert(w.key.clone(), w.value.clone());
            }
            Ok(())
        }

        async fn delete_if_lte(
            &self,
            _key: &str,
            _threshold: i64,
        ) -> std::result::Result<bool, CacheError> {
            Ok(false)
        }
    }

    // --- Mock PriceHistoryRepository ---
    #[derive(Default)]
    struct MockPriceHistory {
        ticks: HashMap<String, PriceTick>,
    }

    impl MockPriceHistory {
        fn with_tick(mut self, tick: PriceTick) -> Self {
            self.ticks
                .insert(format!("{}:{}", tick.symbol, tick.currency), tick);
            self
        }
    }

    #[async_trait]
    impl PriceHistoryRepositoryTrait for MockPriceHistory {
        async fn latest_tick(&self, symbol: &str, currency: &str) -> Result<Option<PriceTick>> {
            Ok(self.ticks.get(&format!("{}:{}", symbol, currency)).cloned())
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn empty_symbol_set_returns_empty_without_io() {
        let service = PriceService::new(
            Arc::new(MockCacheStore::default()),
            Arc::new(MockPriceHistory::default()),
        );

        let latest = service.latest(&[], "usd").await.unwrap();

        assert!(latest.prices.is_empty());
        assert_eq!(latest.as_of, None);
    }

    #[tokio::test]
    async fn cached_snapshot_is_filtered_to_requested_symbols() {
        let store = Arc::new(MockCacheStore::default());
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        store
            .set(
                &prices_latest_key("usd"),
                &format!(
                    r#"{{"at":"{}","prices":{{"BTC":50000.0,"ETH":2500.0,"SOL":100.0}}}}"#,
                    at.to_rfc3339()
                ),
                600,
            )
            .await
            .unwrap();

        let service = PriceService::new(store, Arc::new(MockPriceHistory::default()));
        let latest = service.latest(&symbols(&["BTC", "ETH", "XRP"]), "USD").await.unwrap();

        assert_eq!(latest.source, PriceSource::Cache);
        assert_eq!(latest.as_of, Some(at));
        assert_eq!(latest.prices.len(), 2);
        assert_eq!(latest.prices.get("BTC"), Some(&50000.0));
        assert_eq!(latest.prices.get("ETH"), Some(&2500.0));
        // Unknown symbols are omitted, not errors.
        assert!(!latest.prices.contains_key("XRP"));
    }

    #[tokio::test]
    async fn missing_snapshot_falls_back_to_durable_history() {
        let at = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
        let history = MockPriceHistory::default().with_tick(PriceTick {
            symbol: "BTC".to_string(),
            currency: "USD".to_string(),
            price: dec!(48000.5),
            at,
        });

        let service = PriceService::new(Arc::new(MockCacheStore::default()), Arc::new(history));
        let latest = service.latest(&symbols(&["BTC", "ETH"]), "USD").await.unwrap();

        assert_eq!(latest.source, PriceSource::Durable);
        assert_eq!(latest.as_of, Some(at));
        assert_eq!(latest.prices.get("BTC"), Some(&48000.5));
        assert!(!latest.prices.contains_key("ETH"));
    }

    #[tokio::test]
    async fn corrupt_snapshot_falls_back_to_durable_history() {
        let store = Arc::new(MockCacheStore::default());
        store
            .set(&prices_latest_key("usd"), "not json", 600)
            .await
            .unwrap();

        let at = Utc.timestamp_opt(1_700_000_200, 0).unwrap();
        let history = MockPriceHistory::default().with_tick(PriceTick {
            symbol: "ETH".to_string(),
            currency: "USD".to_string(),
            price: dec!(2600),
            at,
        });

        let service = PriceService::new(store, Arc::new(history));
        let latest = service.latest(&symbols(&["ETH"]), "usd").await.unwrap();

        assert_eq!(latest.source, PriceSource::Durable);
        assert_eq!(latest.prices.get("ETH"), Some(&2600.0));
    }
}
