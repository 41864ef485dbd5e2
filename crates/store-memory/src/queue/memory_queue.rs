//! At-least-once delayed job delivery with enqueue-time dedup.
//!
//! The queue half accepts jobs and rejects a dedup key that is already
//! pending; the runner half delivers each job on its own task after the
//! configured delay, retrying failures within the job's attempt/backoff
//! budget. A dedup key is held from enqueue until the final attempt
//! finishes, so concurrent triggers collapse while work is outstanding and
//! a fresh trigger is accepted again afterwards. Nothing here guarantees
//! exactly-once: consumers are expected to be idempotent.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use tokio::sync::mpsc;

use coinfolio_core::errors::QueueError;
use coinfolio_core::scheduler::{JobOptions, JobQueueTrait, RecomputeJob, RecomputeJobHandlerTrait};

#[derive(Debug)]
struct Delivery {
    job: RecomputeJob,
    options: JobOptions,
}

/// Producer half; cheap to clone and share across services.
#[derive(Clone)]
pub struct MemoryJobQueue {
    tx: mpsc::UnboundedSender<Delivery>,
    pending: Arc<Mutex<HashSet<String>>>,
}

/// Consumer half; drives deliveries against a handler until the queue is
/// dropped.
pub struct JobRunner {
    rx: mpsc::UnboundedReceiver<Delivery>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl MemoryJobQueue {
    pub fn channel() -> (Self, JobRunner) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(HashSet::new()));
        (
            Self {
                tx,
                pending: pending.clone(),
            },
            JobRunner { rx, pending },
        )
    }
}

#[async_trait]
impl JobQueueTrait for MemoryJobQueue {
    async fn enqueue(&self, job: RecomputeJob, options: JobOptions) -> Result<(), QueueError> {
        {
            let mut pending = self
                .pending
                .lock()
                .map_err(|e| QueueError::Enqueue(e.to_string()))?;
            if !pending.insert(options.dedup_key.clone()) {
                return Err(QueueError::Duplicate(options.dedup_key.clone()));
            }
        }

        self.tx.send(Delivery { job, options }).map_err(|e| {
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(&e.0.options.dedup_key);
            }
            QueueError::Enqueue("job runner is gone".to_string())
        })
    }
}

impl JobRunner {
    /// Deliver jobs until all queue handles are dropped. Each delivery runs
    /// on its own task so a slow job never blocks the next one.
    pub async fn run(mut self, handler: Arc<dyn RecomputeJobHandlerTrait>) {
        debug!("Job runner started");
        while let Some(delivery) = self.rx.recv().await {
            let handler = handler.clone();
            let pending = self.pending.clone();
            tokio::spawn(async move {
                execute(&delivery, handler.as_ref()).await;
                if let Ok(mut pending) = pending.lock() {
                    pending.remove(&delivery.options.dedup_key);
                }
            });
        }
        debug!("Job runner shutting down");
    }
}

async fn execute(delivery: &Delivery, handler: &dyn RecomputeJobHandlerTrait) {
    let Delivery { job, options } = delivery;

    if options.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(options.delay_ms)).await;
    }

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match handler.handle(job).await {
            Ok(()) => return,
            Err(e) if attempt < options.max_attempts => {
                let backoff_ms = options.backoff.delay_ms(attempt);
                warn!(
                    "Job {} attempt {}/{} failed: {}. Retrying in {}ms",
                    job.id, attempt, options.max_attempts, e, backoff_ms
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => {
                error!(
                    "Job {} exhausted {} attempts: {}. Dropping it; the next trigger reschedules.",
                    job.id, attempt, e
                );
                return;
            }
        }
    }
}
