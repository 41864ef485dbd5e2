//! End-to-end tests for the valuation engine over the in-process backends:
//! real cache store, real job queue and runner, real worker - only the
//! ledger repositories and (in the race test) the price oracle are mocked.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use coinfolio_core::cache::{summary_key, CacheStoreTrait, ResultCache};
use coinfolio_core::errors::{QueueError, Result};
use coinfolio_core::ledger::{
    LedgerTransaction, Portfolio, PortfolioRepositoryTrait, TransactionKind,
    TransactionRepositoryTrait,
};
use coinfolio_core::prices::{
    prices_latest_key, LatestPrices, PriceHistoryRepositoryTrait, PriceOracleTrait, PriceService,
    PriceSource, PriceTick,
};
use coinfolio_core::scheduler::{
    follow_up_dedup_key, JobOptions, JobQueueTrait, RecomputeJob, RecomputeJobHandlerTrait,
    RecomputeScheduler,
};
use coinfolio_core::staleness::{dirty_key, StalenessTracker};
use coinfolio_core::summary::{
    PortfolioSummary, PortfolioValuationService, PortfolioValuationServiceTrait, ValuationRead,
};
use coinfolio_core::worker::{RecomputeOutcome, RecomputeWorker};
use coinfolio_store_memory::{MemoryCacheStore, MemoryJobQueue};

// --- Mock repositories ---

struct FixedPortfolioRepository {
    portfolio: Portfolio,
}

#[async_trait]
impl PortfolioRepositoryTrait for FixedPortfolioRepository {
    async fn get(&self, portfolio_id: &str) -> Result<Option<Portfolio>> {
        Ok((self.portfolio.id == portfolio_id).then(|| self.portfolio.clone()))
    }
}

#[derive(Default)]
struct SharedTransactionRepository {
    txs: Mutex<Vec<LedgerTransaction>>,
}

impl SharedTransactionRepository {
    fn append(&self, tx: LedgerTransaction) {
        self.txs.lock().unwrap().push(tx);
    }
}

#[async_trait]
impl TransactionRepositoryTrait for SharedTransactionRepository {
    async fn list_for_portfolio(&self, _portfolio_id: &str) -> Result<Vec<LedgerTransaction>> {
        Ok(self.txs.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct EmptyPriceHistory;

#[async_trait]
impl PriceHistoryRepositoryTrait for EmptyPriceHistory {
    async fn latest_tick(&self, _symbol: &str, _currency: &str) -> Result<Option<PriceTick>> {
        Ok(None)
    }
}

/// Wraps the real worker so tests can count deliveries.
struct CountingWorker {
    worker: RecomputeWorker,
    deliveries: AtomicU32,
}

#[async_trait]
impl RecomputeJobHandlerTrait for CountingWorker {
    async fn handle(&self, job: &RecomputeJob) -> Result<()> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        self.worker.process(job).await?;
        Ok(())
    }
}

// --- Fixture ---

fn portfolio() -> Portfolio {
    Portfolio {
        id: "pf-1".to_string(),
        name: "Main".to_string(),
        base_currency: "USD".to_string(),
    }
}

fn tx(
    seq: i64,
    kind: TransactionKind,
    symbol: &str,
    quantity: Decimal,
    price: Decimal,
) -> LedgerTransaction {
    LedgerTransaction {
        id: format!("tx-{}", seq),
        kind,
        symbol: symbol.to_string(),
        quantity,
        price: Some(price),
        at: Utc.timestamp_opt(1_690_000_000 + seq, 0).unwrap(),
    }
}

struct Engine {
    store: Arc<MemoryCacheStore>,
    txs: Arc<SharedTransactionRepository>,
    service: PortfolioValuationService,
    handler: Arc<CountingWorker>,
}

async fn engine(txs: Vec<LedgerTransaction>) -> Engine {
    let store = Arc::new(MemoryCacheStore::new());
    let (queue, runner) = MemoryJobQueue::channel();
    let queue = Arc::new(queue);

    // Seed the shared price snapshot the ingestion job would maintain.
    let snapshot = serde_json::json!({
        "at": Utc.timestamp_opt(1_700_000_000, 0).unwrap().to_rfc3339(),
        "prices": { "BTC": 50_000.0, "ETH": 2_500.0 },
    });
    store
        .set(&prices_latest_key("USD"), &snapshot.to_string(), 600)
        .await
        .unwrap();

    let portfolio_repo = Arc::new(FixedPortfolioRepository {
        portfolio: portfolio(),
    });
    let tx_repo = Arc::new(SharedTransactionRepository::default());
    for t in txs {
        tx_repo.append(t);
    }

    let oracle = Arc::new(PriceService::new(
        store.clone() as Arc<dyn CacheStoreTrait>,
        Arc::new(EmptyPriceHistory),
    ));

    let worker = RecomputeWorker::new(
        portfolio_repo.clone(),
        tx_repo.clone(),
        oracle,
        ResultCache::new(store.clone()),
        StalenessTracker::new(store.clone()),
        RecomputeScheduler::new(queue.clone()),
    );
    let handler = Arc::new(CountingWorker {
        worker,
        deliveries: AtomicU32::new(0),
    });
    tokio::spawn(runner.run(handler.clone()));

    let service = PortfolioValuationService::new(
        portfolio_repo,
        ResultCache::new(store.clone()),
        StalenessTracker::new(store.clone()),
        RecomputeScheduler::new(queue),
    );

    Engine {
        store,
        txs: tx_repo,
        service,
        handler,
    }
}

/// Polls until the summary reads ready and fresh.
async fn wait_until_fresh(engine: &Engine) -> PortfolioSummary {
    for _ in 0..200 {
        if let ValuationRead::Ready { stale, data, .. } =
            engine.service.summary("pf-1").await.unwrap()
        {
            if !stale {
                return data;
            }
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("valuation never became ready and fresh");
}

// --- Tests ---

#[tokio::test(flavor = "multi_thread")]
async fn cold_start_read_computes_and_serves_the_valuation() {
    let engine = engine(vec![
        tx(1, TransactionKind::Buy, "BTC", dec!(1), dec!(40000)),
        tx(2, TransactionKind::Buy, "ETH", dec!(10), dec!(2000)),
    ])
    .await;

    let first = engine.service.summary("pf-1").await.unwrap();
    assert!(first.is_pending(), "cold read must not block or error");

    let summary = wait_until_fresh(&engine).await;
    assert_eq!(summary.totals.total_value, dec!(75000));
    assert_eq!(summary.total_value, 75_000.0);
    assert_eq!(summary.prices_source, PriceSource::Cache);
    assert_eq!(summary.holdings.len(), 2);
    // BTC (50k) sorts above ETH (25k).
    assert_eq!(summary.holdings[0].symbol, "BTC");

    // The dirty marker is gone once the recompute lands.
    assert_eq!(engine.store.get(&dirty_key("pf-1")).await.unwrap(), None);

    // Positions are published with the summary, atomically.
    match engine.service.positions("pf-1").await.unwrap() {
        ValuationRead::Ready { data, .. } => {
            assert_eq!(data.totals, summary.totals);
            assert!(data.warnings.is_none());
        }
        other => panic!("expected ready positions, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_cold_reads_run_exactly_one_recompute() {
    let engine = engine(vec![tx(
        1,
        TransactionKind::Buy,
        "BTC",
        dec!(2),
        dec!(30000),
    )])
    .await;

    let (a, b, c, d, e) = tokio::join!(
        engine.service.summary("pf-1"),
        engine.service.summary("pf-1"),
        engine.service.positions("pf-1"),
        engine.service.snapshot("pf-1"),
        engine.service.summary("pf-1"),
    );
    assert!(a.unwrap().is_pending());
    assert!(b.unwrap().is_pending());
    assert!(c.unwrap().is_pending());
    assert!(d.unwrap().is_pending());
    assert!(e.unwrap().is_pending());

    // Watch the raw store rather than the read path: a service read while
    // the recompute is still pending would mark the portfolio dirty again
    // and legitimately earn a follow-up job.
    let mut published = false;
    for _ in 0..200 {
        if engine
            .store
            .get(&summary_key("pf-1"))
            .await
            .unwrap()
            .is_some()
        {
            published = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(published, "recompute never published");
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(engine.handler.deliveries.load(Ordering::SeqCst), 1);
    assert_eq!(engine.store.get(&dirty_key("pf-1")).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn ledger_write_triggers_a_recompute_that_folds_it_in() {
    let engine = engine(vec![tx(
        1,
        TransactionKind::Buy,
        "BTC",
        dec!(1),
        dec!(40000),
    )])
    .await;

    engine.service.summary("pf-1").await.unwrap();
    let summary = wait_until_fresh(&engine).await;
    assert_eq!(summary.totals.total_value, dec!(50000));

    // The write path appends a transaction and calls the trigger API.
    engine
        .txs
        .append(tx(2, TransactionKind::Buy, "BTC", dec!(1), dec!(45000)));
    engine.service.mark_dirty_and_schedule("pf-1").await.unwrap();

    let updated = wait_until_fresh(&engine).await;
    assert_eq!(updated.totals.total_value, dec!(100000));
    match engine.service.positions("pf-1").await.unwrap() {
        ValuationRead::Ready { data, .. } => {
            assert_eq!(data.positions[0].avg_cost, Some(dec!(42500)));
        }
        other => panic!("expected ready positions, got {:?}", other),
    }
}

/// A price oracle that simulates a ledger write landing mid-computation by
/// stamping a far-future dirty marker while the worker is loading prices.
struct WriteRacingOracle {
    store: Arc<MemoryCacheStore>,
    marker_millis: i64,
}

#[async_trait]
impl PriceOracleTrait for WriteRacingOracle {
    async fn latest(&self, _symbols: &[String], _currency: &str) -> Result<LatestPrices> {
        self.store
            .set(&dirty_key("pf-1"), &self.marker_millis.to_string(), 300)
            .await?;
        Ok(LatestPrices {
            source: PriceSource::Durable,
            as_of: None,
            prices: HashMap::new(),
        })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn superseding_write_survives_the_worker_and_requeues() {
    let store = Arc::new(MemoryCacheStore::new());
    let (queue, _runner) = MemoryJobQueue::channel();
    let queue = Arc::new(queue);
    let marker_millis = Utc::now().timestamp_millis() + 60_000;

    let worker = RecomputeWorker::new(
        Arc::new(FixedPortfolioRepository {
            portfolio: portfolio(),
        }),
        Arc::new(SharedTransactionRepository::default()),
        Arc::new(WriteRacingOracle {
            store: store.clone(),
            marker_millis,
        }),
        ResultCache::new(store.clone()),
        StalenessTracker::new(store.clone()),
        RecomputeScheduler::new(queue.clone()),
    );

    let outcome = worker.process(&RecomputeJob::new("pf-1")).await.unwrap();

    assert_eq!(outcome, RecomputeOutcome::Superseded);
    // The marker written mid-computation survives the worker's clear step.
    assert_eq!(
        store.get(&dirty_key("pf-1")).await.unwrap(),
        Some(marker_millis.to_string())
    );
    // The follow-up was enqueued under its uniquely-keyed dedup key: a
    // second enqueue with that key collides with the pending job.
    let err = queue
        .enqueue(
            RecomputeJob::new("pf-1"),
            JobOptions::recompute(follow_up_dedup_key("pf-1", marker_millis)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::Duplicate(_)));
}
