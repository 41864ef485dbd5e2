//! Coinfolio in-process store backends.
//!
//! Implements the cache-store and job-queue seams from `coinfolio-core` for
//! single-process deployments and tests: a TTL'd key-value map with atomic
//! multi-key writes and compare-and-delete, and an at-least-once delayed job
//! queue with dedup keys, bounded attempts, and exponential backoff. A
//! networked store would implement the same traits with its own atomic
//! primitives.

pub mod cache;
pub mod queue;

pub use cache::MemoryCacheStore;
pub use queue::{JobRunner, MemoryJobQueue};
