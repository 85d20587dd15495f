use crate::{
    error::{PoolError, ResultError},
    results::ResultTable,
    verify::BatchVerifier,
};
use engine_core::metrics::Metrics;
use futures::future::join_all;
use model::records::{batch::Batch, status::VerificationStatus};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{debug, error, info};

/// Message carried by the work queue.
#[derive(Debug)]
pub enum WorkItem {
    Work(Batch),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    pub batches: u64,
    pub acknowledged: u64,
}

/// Fixed set of workers pulling batches from one bounded queue.
///
/// Workers share the receiving end; the pool only keeps the sender, so once
/// every worker is gone `submit` fails instead of blocking forever.
pub struct WorkerPool {
    tx: mpsc::Sender<WorkItem>,
    handles: Vec<JoinHandle<Result<u64, ResultError>>>,
    alive: Arc<AtomicUsize>,
    batches: u64,
}

impl WorkerPool {
    pub fn spawn<V>(
        workers: usize,
        queue_capacity: usize,
        verifier: Arc<V>,
        results: Arc<ResultTable>,
        metrics: Metrics,
    ) -> Self
    where
        V: BatchVerifier + ?Sized + 'static,
    {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let alive = Arc::new(AtomicUsize::new(workers));

        info!(workers, queue_capacity, "Launching verification workers");

        let handles = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    rx: Arc::clone(&rx),
                    verifier: Arc::clone(&verifier),
                    results: Arc::clone(&results),
                    metrics: metrics.clone(),
                    _alive: AliveGuard(Arc::clone(&alive)),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        WorkerPool {
            tx,
            handles,
            alive,
            batches: 0,
        }
    }

    /// Enqueues a batch, waiting while the queue is full.
    pub async fn submit(&mut self, batch: Batch) -> Result<(), PoolError> {
        debug!(batch_id = batch.id, size = batch.len(), "Dispatching batch");
        self.tx
            .send(WorkItem::Work(batch))
            .await
            .map_err(|_| PoolError::QueueClosed)?;
        self.batches += 1;
        Ok(())
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// False once every worker task has exited.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) > 0
    }

    /// Sends one shutdown message per worker and waits until every enqueued
    /// item has been acknowledged.
    pub async fn shutdown(self) -> Result<PoolReport, PoolError> {
        let WorkerPool {
            tx,
            handles,
            batches,
            ..
        } = self;

        let mut sent = 0u64;
        for _ in 0..handles.len() {
            if tx.send(WorkItem::Shutdown).await.is_err() {
                break;
            }
            sent += 1;
        }
        drop(tx);

        let mut acknowledged = 0u64;
        let mut failure = None;
        for (worker, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(Ok(acked)) => acknowledged += acked,
                Ok(Err(source)) => {
                    error!(worker, error = %source, "Worker failed");
                    if failure.is_none() {
                        failure = Some(PoolError::Worker { worker, source });
                    }
                }
                Err(join_err) => {
                    error!(worker, error = %join_err, "Worker task aborted");
                    if failure.is_none() {
                        failure = Some(PoolError::Join(join_err));
                    }
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        let enqueued = batches + sent;
        if acknowledged != enqueued {
            return Err(PoolError::Unacknowledged {
                acknowledged,
                enqueued,
            });
        }

        info!(batches, "Verification workers drained");
        Ok(PoolReport {
            batches,
            acknowledged,
        })
    }
}

struct AliveGuard(Arc<AtomicUsize>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

struct Worker<V: ?Sized> {
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    verifier: Arc<V>,
    results: Arc<ResultTable>,
    metrics: Metrics,
    _alive: AliveGuard,
}

impl<V: BatchVerifier + ?Sized> Worker<V> {
    /// Returns the number of items this worker acknowledged.
    async fn run(self) -> Result<u64, ResultError> {
        let mut acknowledged = 0u64;

        loop {
            // The lock only guards the dequeue, never the verification call.
            let item = self.rx.lock().await.recv().await;

            match item {
                Some(WorkItem::Work(batch)) => {
                    let numbers = batch.numbers();
                    let statuses = self.verifier.verify(&numbers).await;

                    self.results.record_all(batch.members().iter().map(|member| {
                        let status = statuses
                            .get(&member.number)
                            .copied()
                            .unwrap_or(VerificationStatus::Error);
                        (member.index, status)
                    }))?;

                    self.metrics.increment_verified(1);
                    acknowledged += 1;
                    debug!(worker = self.id, batch_id = batch.id, "Batch recorded");
                }
                Some(WorkItem::Shutdown) => {
                    acknowledged += 1;
                    debug!(worker = self.id, acknowledged, "Worker shutting down");
                    return Ok(acknowledged);
                }
                None => return Ok(acknowledged),
            }
        }
    }
}
