//! TTL'd in-process key-value store.
//!
//! Every mutation runs under one write lock, which is what gives `set_many`
//! and `delete_if_lte` the single-step semantics the `CacheStoreTrait`
//! contract demands. Expiry is lazy: expired entries read as missing and are
//! physically dropped when next touched by a mutation.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use coinfolio_core::cache::{CacheStoreTrait, CacheWrite};
use coinfolio_core::errors::CacheError;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &str, ttl_seconds: u64) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries. Test and diagnostics helper.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| !e.expired()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStoreTrait for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), Entry::new(value, ttl_seconds));
        Ok(())
    }

    async fn set_many(&self, writes: &[CacheWrite]) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        for write in writes {
            entries.insert(
                write.key.clone(),
                Entry::new(&write.value, write.ttl_seconds),
            );
        }
        Ok(())
    }

    async fn delete_if_lte(&self, key: &str, threshold: i64) -> Result<bool, CacheError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        let Some(entry) = entries.get(key) else {
            return Ok(false);
        };
        if entry.expired() {
            entries.remove(key);
            return Ok(false);
        }

        let deletable = entry
            .value
            .parse::<i64>()
            .map(|current| current <= threshold)
            .unwrap_or(false);
        if deletable {
            entries.remove(key);
        }
        Ok(deletable)
    }
}
