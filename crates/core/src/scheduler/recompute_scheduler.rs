//! Deduplicated scheduling of valuation recomputes.

use std::sync::Arc;

use log::{debug, error};

use crate::constants::RECOMPUTE_JOB_KIND;
use crate::scheduler::{JobOptions, JobQueueTrait, RecomputeJob};

pub fn recompute_dedup_key(portfolio_id: &str) -> String {
    format!("{}:{}", RECOMPUTE_JOB_KIND, portfolio_id)
}

/// Dedup key for a follow-up recompute. Encoding the superseding timestamp
/// guarantees the job is never dropped as a duplicate of the one that
/// already ran.
pub fn follow_up_dedup_key(portfolio_id: &str, superseding_millis: i64) -> String {
    format!("{}:{}:{}", RECOMPUTE_JOB_KIND, portfolio_id, superseding_millis)
}

#[derive(Clone)]
pub struct RecomputeScheduler {
    queue: Arc<dyn JobQueueTrait>,
}

impl RecomputeScheduler {
    pub fn new(queue: Arc<dyn JobQueueTrait>) -> Self {
        Self { queue }
    }

    /// Enqueue a recompute for the portfolio, deduplicated on portfolio id.
    ///
    /// A duplicate is success: some pending job will pick up the latest
    /// ledger state anyway. Any other enqueue failure is logged and
    /// swallowed so the triggering write still succeeds; until the next
    /// trigger the cache stays stale, which readers can see through the
    /// `stale` flag.
    pub async fn schedule_recompute(&self, portfolio_id: &str) {
        let key = recompute_dedup_key(portfolio_id);
        self.enqueue_logged(portfolio_id, key).await;
    }

    /// Enqueue a follow-up recompute for a write that superseded a running
    /// worker.
    pub async fn schedule_follow_up(&self, portfolio_id: &str, superseding_millis: i64) {
        let key = follow_up_dedup_key(portfolio_id, superseding_millis);
        self.enqueue_logged(portfolio_id, key).await;
    }

    async fn enqueue_logged(&self, portfolio_id: &str, dedup_key: String) {
        let job = RecomputeJob::new(portfolio_id);
        let job_id = job.id;
        match self
            .queue
            .enqueue(job, JobOptions::recompute(dedup_key.clone()))
            .await
        {
            Ok(()) => debug!(
                "Enqueued recompute {} for portfolio {} (dedup {})",
                job_id, portfolio_id, dedup_key
            ),
            Err(e) if e.is_duplicate() => debug!(
                "Recompute for portfolio {} already pending (dedup {})",
                portfolio_id, dedup_key
            ),
            Err(e) => error!(
                "Failed to enqueue recompute for portfolio {}: {}. Cache stays stale until the next trigger.",
                portfolio_id, e
            ),
        }
    }
}
