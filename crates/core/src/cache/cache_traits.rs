//! Key-value store trait.
//!
//! All cross-process coordination in the engine goes through these
//! primitives; there are no in-process locks shared between requests. Any
//! store offering TTL'd strings, an atomic multi-key write, and a
//! server-side compare-and-delete can implement this trait.

use async_trait::async_trait;

use crate::errors::CacheError;

/// One entry of an atomic multi-key write.
#[derive(Debug, Clone)]
pub struct CacheWrite {
    pub key: String,
    pub value: String,
    pub ttl_seconds: u64,
}

/// Minimal atomic key-value store surface required by the engine.
#[async_trait]
pub trait CacheStoreTrait: Send + Sync {
    /// Fetch a value. Expired and missing keys both read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a value with a TTL, overwriting any prior value.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Write all entries atomically: readers observe either none or all of
    /// them.
    async fn set_many(&self, writes: &[CacheWrite]) -> Result<(), CacheError>;

    /// Atomic compare-and-delete: parse the current value as an integer and
    /// delete the key iff `value <= threshold`, returning whether a delete
    /// happened. Evaluated store-side in one step; a missing, expired, or
    /// non-numeric value reads as "not deleted". This is the fencing
    /// primitive the dirty-marker protocol relies on.
    async fn delete_if_lte(&self, key: &str, threshold: i64) -> Result<bool, CacheError>;
}
