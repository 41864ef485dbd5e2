//! Job queue traits.

use async_trait::async_trait;

use super::{JobOptions, RecomputeJob};
use crate::errors::{QueueError, Result};

/// An external at-least-once job queue.
///
/// Dedup keys collapse concurrently-triggered duplicates into one pending
/// job at enqueue time; the queue does NOT guarantee that two distinct jobs
/// for the same portfolio never execute in parallel.
#[async_trait]
pub trait JobQueueTrait: Send + Sync {
    async fn enqueue(
        &self,
        job: RecomputeJob,
        options: JobOptions,
    ) -> std::result::Result<(), QueueError>;
}

/// Consumes recompute jobs delivered by a queue runner.
#[async_trait]
pub trait RecomputeJobHandlerTrait: Send + Sync {
    /// Process one delivery. Errors make the runner retry within its
    /// attempt/backoff budget.
    async fn handle(&self, job: &RecomputeJob) -> Result<()>;
}
