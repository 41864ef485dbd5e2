//! The recompute worker.
//!
//! Each job runs the same straight line: load the ledger and prices, replay
//! the ledger through the calculator, publish both cached payloads
//! atomically, then resolve the race against writes that arrived while the
//! job was running. Recomputation has no side effects besides the final
//! publish, so at-least-once delivery and the occasional overlapping
//! normal/follow-up pair are harmless.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::cache::ResultCache;
use crate::errors::Result;
use crate::ledger::{
    LedgerTransaction, PortfolioRepositoryTrait, TransactionKind, TransactionRepositoryTrait,
};
use crate::prices::PriceOracleTrait;
use crate::scheduler::{RecomputeJob, RecomputeJobHandlerTrait, RecomputeScheduler};
use crate::staleness::StalenessTracker;
use crate::summary::{PortfolioRef, PortfolioSummary, PositionsPayload};
use crate::valuation::calculate_positions_average_cost;

/// Terminal state of one recompute job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    /// The portfolio no longer exists; nothing was published.
    PortfolioMissing,
    /// A write arrived after this job started; the marker was left in place
    /// and a follow-up job was scheduled.
    Superseded,
    /// The job finished as the newest known state. `cleared` reports
    /// whether a marker was actually deleted (false when none existed, or
    /// when a last-instant write won the compare-and-delete race).
    Cleared { cleared: bool },
}

#[derive(Clone)]
pub struct RecomputeWorker {
    portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    price_oracle: Arc<dyn PriceOracleTrait>,
    result_cache: ResultCache,
    staleness: StalenessTracker,
    scheduler: RecomputeScheduler,
}

impl RecomputeWorker {
    pub fn new(
        portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        price_oracle: Arc<dyn PriceOracleTrait>,
        result_cache: ResultCache,
        staleness: StalenessTracker,
        scheduler: RecomputeScheduler,
    ) -> Self {
        Self {
            portfolio_repository,
            transaction_repository,
            price_oracle,
            result_cache,
            staleness,
            scheduler,
        }
    }

    /// Run one job to its terminal state.
    pub async fn process(&self, job: &RecomputeJob) -> Result<RecomputeOutcome> {
        let portfolio_id = job.portfolio_id.as_str();
        let t0 = Utc::now().timestamp_millis();
        debug!("Recompute {} started for portfolio {}", job.id, portfolio_id);

        // Loaded
        let Some(portfolio) = self.portfolio_repository.get(portfolio_id).await? else {
            debug!(
                "Portfolio {} vanished before recompute {}; nothing to do",
                portfolio_id, job.id
            );
            return Ok(RecomputeOutcome::PortfolioMissing);
        };
        let txs = self
            .transaction_repository
            .list_for_portfolio(portfolio_id)
            .await?;

        let currency = portfolio.base_currency.to_uppercase();
        let held = held_symbols(&txs);
        let latest = self.price_oracle.latest(&held, &currency).await?;

        // Computed
        let result = calculate_positions_average_cost(&txs, &latest.prices);

        // Published
        let computed_at = Utc::now();
        let summary = PortfolioSummary {
            portfolio: PortfolioRef {
                id: portfolio.id.clone(),
                name: portfolio.name.clone(),
                currency,
            },
            prices_source: latest.source,
            prices_at: latest.as_of,
            total_value: result.totals.total_value.to_f64().unwrap_or(0.0),
            holdings: result.positions.clone(),
            totals: result.totals.clone(),
            computed_at,
        };
        let positions = PositionsPayload {
            positions: result.positions,
            totals: result.totals,
            warnings: result.warnings,
            computed_at,
        };
        self.result_cache
            .publish(portfolio_id, &summary, &positions)
            .await?;

        // Cleared or Superseded
        match self.staleness.dirty_at(portfolio_id).await? {
            Some(marker) if marker > t0 => {
                // A write landed mid-computation. Leave its evidence alone
                // and make sure a uniquely-keyed job folds it in.
                debug!(
                    "Recompute {} superseded: marker {} > start {}",
                    job.id, marker, t0
                );
                self.scheduler
                    .schedule_follow_up(portfolio_id, marker)
                    .await;
                Ok(RecomputeOutcome::Superseded)
            }
            _ => {
                let cleared = self
                    .staleness
                    .clear_if_not_superseded(portfolio_id, t0)
                    .await?;
                debug!(
                    "Recompute {} finished for portfolio {} (marker cleared: {})",
                    job.id, portfolio_id, cleared
                );
                Ok(RecomputeOutcome::Cleared { cleared })
            }
        }
    }
}

/// Symbols with a positive net signed quantity. Only these need current
/// prices; the calculator handles clamping for everything else.
fn held_symbols(txs: &[LedgerTransaction]) -> Vec<String> {
    let mut net: BTreeMap<&str, Decimal> = BTreeMap::new();
    for tx in txs {
        let entry = net.entry(tx.symbol.as_str()).or_insert(Decimal::ZERO);
        match tx.kind {
            TransactionKind::Buy => *entry += tx.quantity,
            TransactionKind::Sell => *entry -= tx.quantity,
        }
    }
    net.into_iter()
        .filter(|(_, qty)| *qty > Decimal::ZERO)
        .map(|(sym, _)| sym.to_string())
        .collect()
}

#[async_trait]
impl RecomputeJobHandlerTrait for RecomputeWorker {
    async fn handle(&self, job: &RecomputeJob) -> Result<()> {
        self.process(job).await?;
        Ok(())
    }
}
