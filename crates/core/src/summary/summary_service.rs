//! Non-blocking valuation reads and the write-path trigger.
//!
//! Reads consult the result cache first. On a miss they start the same
//! dirty+enqueue path a ledger write uses (the cold-start case) and return a
//! pending response immediately; they never block on a recompute. A cache
//! outage surfaces as an explicit error, never as silently empty data.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::cache::ResultCache;
use crate::constants::READ_RETRY_AFTER_MS;
use crate::errors::{Error, Result};
use crate::ledger::PortfolioRepositoryTrait;
use crate::scheduler::RecomputeScheduler;
use crate::staleness::StalenessTracker;
use crate::summary::{
    PortfolioSummary, PositionsPayload, ReadSource, ValuationRead, ValuationSnapshot,
};

#[async_trait]
pub trait PortfolioValuationServiceTrait: Send + Sync {
    /// Headline valuation for the portfolio.
    async fn summary(&self, portfolio_id: &str) -> Result<ValuationRead<PortfolioSummary>>;

    /// Full position breakdown for the portfolio.
    async fn positions(&self, portfolio_id: &str) -> Result<ValuationRead<PositionsPayload>>;

    /// Both payloads in one response; ready when either is cached.
    async fn snapshot(&self, portfolio_id: &str) -> Result<ValuationRead<ValuationSnapshot>>;

    /// Trigger API for the write path: mark the portfolio dirty and schedule
    /// a deduplicated recompute. Returns the marker timestamp.
    async fn mark_dirty_and_schedule(&self, portfolio_id: &str) -> Result<i64>;
}

#[derive(Clone)]
pub struct PortfolioValuationService {
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    result_cache: ResultCache,
    staleness: StalenessTracker,
    scheduler: RecomputeScheduler,
}

impl PortfolioValuationService {
    pub fn new(
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        result_cache: ResultCache,
        staleness: StalenessTracker,
        scheduler: RecomputeScheduler,
    ) -> Self {
        Self {
            portfolio_repository,
            result_cache,
            staleness,
            scheduler,
        }
    }

    /// A cache miss for an unknown portfolio is a distinct not-found, and it
    /// must be decided before any dirty/enqueue side effects run.
    async fn ensure_portfolio_exists(&self, portfolio_id: &str) -> Result<()> {
        match self.portfolio_repository.get(portfolio_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!(
                "Portfolio {} not found",
                portfolio_id
            ))),
        }
    }

    async fn cold_start<T>(&self, portfolio_id: &str) -> Result<ValuationRead<T>> {
        self.ensure_portfolio_exists(portfolio_id).await?;
        self.mark_dirty_and_schedule(portfolio_id).await?;
        debug!("Cold-start recompute triggered for portfolio {}", portfolio_id);
        Ok(ValuationRead::Pending {
            source: ReadSource::Queue,
            retry_after_ms: READ_RETRY_AFTER_MS,
        })
    }
}

#[async_trait]
impl PortfolioValuationServiceTrait for PortfolioValuationService {
    async fn summary(&self, portfolio_id: &str) -> Result<ValuationRead<PortfolioSummary>> {
        let (cached, dirty_at) = tokio::join!(
            self.result_cache.get_summary(portfolio_id),
            self.staleness.dirty_at(portfolio_id),
        );
        let dirty_at = dirty_at?;

        if let Some(data) = cached? {
            return Ok(ValuationRead::Ready {
                source: ReadSource::Cache,
                stale: dirty_at.is_some(),
                dirty_at,
                data,
            });
        }

        self.cold_start(portfolio_id).await
    }

    async fn positions(&self, portfolio_id: &str) -> Result<ValuationRead<PositionsPayload>> {
        let (cached, dirty_at) = tokio::join!(
            self.result_cache.get_positions(portfolio_id),
            self.staleness.dirty_at(portfolio_id),
        );
        let dirty_at = dirty_at?;

        if let Some(data) = cached? {
            return Ok(ValuationRead::Ready {
                source: ReadSource::Cache,
                stale: dirty_at.is_some(),
                dirty_at,
                data,
            });
        }

        self.cold_start(portfolio_id).await
    }

    async fn snapshot(&self, portfolio_id: &str) -> Result<ValuationRead<ValuationSnapshot>> {
        let (summary, positions, dirty_at) = tokio::join!(
            self.result_cache.get_summary(portfolio_id),
            self.result_cache.get_positions(portfolio_id),
            self.staleness.dirty_at(portfolio_id),
        );
        let summary = summary?;
        let positions = positions?;
        let dirty_at = dirty_at?;

        if summary.is_some() || positions.is_some() {
            return Ok(ValuationRead::Ready {
                source: ReadSource::Cache,
                stale: dirty_at.is_some(),
                dirty_at,
                data: ValuationSnapshot { summary, positions },
            });
        }

        self.cold_start(portfolio_id).await
    }

    async fn mark_dirty_and_schedule(&self, portfolio_id: &str) -> Result<i64> {
        let marked_at = self.staleness.mark_dirty(portfolio_id).await?;
        self.scheduler.schedule_recompute(portfolio_id).await;
        Ok(marked_at)
    }
}
