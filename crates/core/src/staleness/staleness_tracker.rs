//! Per-portfolio dirty markers.
//!
//! A marker is an epoch-millis timestamp with a TTL. Presence means "the
//! cached valuation may be stale". Writes overwrite unconditionally
//! (last-writer-wins); only the monotone growth of the timestamp matters to
//! the clearing protocol, never accumulation. The timestamp doubles as a
//! fencing token: a worker may only clear a marker that is not newer than
//! its own start time, and the comparison happens inside the store's atomic
//! compare-and-delete.

use std::sync::Arc;

use chrono::Utc;
use log::warn;

use crate::cache::CacheStoreTrait;
use crate::constants::DIRTY_MARKER_TTL_SECS;
use crate::errors::Result;

pub fn dirty_key(portfolio_id: &str) -> String {
    format!("portfolio:dirty:{}", portfolio_id)
}

#[derive(Clone)]
pub struct StalenessTracker {
    store: Arc<dyn CacheStoreTrait>,
}

impl StalenessTracker {
    pub fn new(store: Arc<dyn CacheStoreTrait>) -> Self {
        Self { store }
    }

    /// Mark the portfolio dirty as of now. Returns the written timestamp.
    pub async fn mark_dirty(&self, portfolio_id: &str) -> Result<i64> {
        let now_millis = Utc::now().timestamp_millis();
        self.store
            .set(
                &dirty_key(portfolio_id),
                &now_millis.to_string(),
                DIRTY_MARKER_TTL_SECS,
            )
            .await?;
        Ok(now_millis)
    }

    /// The current marker timestamp, or `None` when the portfolio is clean
    /// (or the marker expired).
    pub async fn dirty_at(&self, portfolio_id: &str) -> Result<Option<i64>> {
        let raw = self.store.get(&dirty_key(portfolio_id)).await?;
        Ok(raw.and_then(|s| match s.parse::<i64>() {
            Ok(millis) => Some(millis),
            Err(_) => {
                warn!(
                    "Ignoring non-numeric dirty marker for portfolio {}: {:?}",
                    portfolio_id, s
                );
                None
            }
        }))
    }

    /// Clear the marker iff it has not been superseded by a newer write,
    /// i.e. its value is `<= as_of_millis`. Runs as a single store-side
    /// compare-and-delete, so a slow worker can never erase evidence left by
    /// a write that arrived after it started reading. Returns whether the
    /// marker was cleared.
    pub async fn clear_if_not_superseded(
        &self,
        portfolio_id: &str,
        as_of_millis: i64,
    ) -> Result<bool> {
        let cleared = self
            .store
            .delete_if_lte(&dirty_key(portfolio_id), as_of_millis)
            .await?;
        Ok(cleared)
    }
}
