//! Recompute job models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{RECOMPUTE_BACKOFF_BASE_MS, RECOMPUTE_DELAY_MS, RECOMPUTE_MAX_ATTEMPTS};

/// Payload of a recompute job. Everything else the worker needs it reloads
/// from shared state, which is what makes redelivery harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeJob {
    /// Correlation id for logs; not used for dedup.
    pub id: Uuid,
    pub portfolio_id: String,
}

impl RecomputeJob {
    pub fn new(portfolio_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            portfolio_id: portfolio_id.into(),
        }
    }
}

/// Retry backoff policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Backoff {
    #[serde(rename_all = "camelCase")]
    Exponential { base_delay_ms: u64 },
}

impl Backoff {
    /// Delay before retrying after the given 1-based failed attempt.
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        match self {
            Backoff::Exponential { base_delay_ms } => {
                base_delay_ms.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(16))
            }
        }
    }
}

/// Enqueue options for a recompute job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    /// The queue must reject a second enqueue with the same key while one is
    /// already pending.
    pub dedup_key: String,
    pub delay_ms: u64,
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl JobOptions {
    pub fn recompute(dedup_key: String) -> Self {
        Self {
            dedup_key,
            delay_ms: RECOMPUTE_DELAY_MS,
            max_attempts: RECOMPUTE_MAX_ATTEMPTS,
            backoff: Backoff::Exponential {
                base_delay_ms: RECOMPUTE_BACKOFF_BASE_MS,
            },
        }
    }
}
