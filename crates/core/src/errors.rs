//! Core error types for the Coinfolio valuation engine.
//!
//! This module defines store-agnostic error types. Backend-specific errors
//! (from the cache store or the job queue) are converted to these types by
//! the store layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the valuation engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cache store operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Job queue operation failed: {0}")]
    Queue(#[from] QueueError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Store-agnostic error type for cache operations.
///
/// Implementations convert their transport errors into this format. A cache
/// outage is a distinct, reportable condition on the read path and must never
/// degrade into silently empty data.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache store could not be reached or the operation failed.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// A cached payload could not be serialized or deserialized.
    #[error("Cache serialization failed: {0}")]
    Serialization(String),
}

/// Error type for job queue enqueue operations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// A job with the same dedup key is already pending. Expected under
    /// concurrent triggers; callers treat it as an idempotent no-op.
    #[error("Job with dedup key '{0}' is already pending")]
    Duplicate(String),

    /// The queue rejected the job for any other reason.
    #[error("Failed to enqueue job: {0}")]
    Enqueue(String),
}

impl QueueError {
    /// Whether this enqueue failure is the expected dedup collision.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, QueueError::Duplicate(_))
    }
}

// === From implementations for common error types ===

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Cache(CacheError::Serialization(err.to_string()))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
