use crate::{error::RunError, report::RunSummary};
use chrono::Utc;
use connectors::{error::AdapterError, sink::RowSink, source::RowSource};
use engine_config::settings::Settings;
use engine_core::metrics::Metrics;
use engine_processing::{
    batcher::Batcher,
    error::PoolError,
    normalize::Normalizer,
    pool::WorkerPool,
    results::ResultTable,
    verify::BatchVerifier,
    writer::{DrainMode, OrderedWriter, PendingWindow},
};
use model::records::{batch::Batch, row::Row, status::VerificationStatus};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long backpressure waits for a result before re-checking the pool.
const PRESSURE_POLL: Duration = Duration::from_millis(250);

/// Reads, normalizes, batches and dispatches rows, then writes them back in
/// input order.
pub struct Pipeline<N, V: ?Sized> {
    settings: Settings,
    normalizer: N,
    verifier: Arc<V>,
    metrics: Metrics,
    cancel: CancellationToken,
}

/// Per-run mutable state owned by the coordinating task.
struct RunState<S> {
    window: PendingWindow,
    batcher: Batcher,
    writer: OrderedWriter<S>,
    results: Arc<ResultTable>,
    pool: WorkerPool,
}

impl<N, V> Pipeline<N, V>
where
    N: Normalizer,
    V: BatchVerifier + ?Sized + 'static,
{
    pub fn new(settings: Settings, normalizer: N, verifier: Arc<V>, metrics: Metrics) -> Self {
        Pipeline {
            settings,
            normalizer,
            verifier,
            metrics,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops ingestion when the token is cancelled. Rows already read are
    /// still verified and written.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn run<Src, Snk>(
        &self,
        source: &mut Src,
        sink: Snk,
    ) -> Result<(RunSummary, Snk), RunError>
    where
        Src: RowSource,
        Snk: RowSink,
    {
        let started_at = Utc::now();
        let clock = Instant::now();

        let number_position = source
            .columns()
            .position(&self.settings.number_column)
            .ok_or_else(|| AdapterError::MissingColumn(self.settings.number_column.clone()))?;

        info!(
            number_column = %self.settings.number_column,
            concurrency = self.settings.concurrency,
            batch_size = self.settings.batch_size,
            "Starting verification run"
        );

        let results = Arc::new(ResultTable::new());
        let pool = WorkerPool::spawn(
            self.settings.concurrency,
            self.settings.queue_capacity(),
            Arc::clone(&self.verifier),
            Arc::clone(&results),
            self.metrics.clone(),
        );

        let mut state = RunState {
            window: PendingWindow::new(),
            batcher: Batcher::new(self.settings.batch_size),
            writer: OrderedWriter::new(sink),
            results,
            pool,
        };

        let interrupted = self.ingest(source, number_position, &mut state).await?;

        if let Some(batch) = state.batcher.flush() {
            self.dispatch(&mut state.pool, batch).await?;
        }

        let RunState {
            mut window,
            mut writer,
            results,
            pool,
            ..
        } = state;

        let pool_outcome = pool.shutdown().await;
        if let Err(err) = &pool_outcome {
            error!(error = %err, "Worker pool did not shut down cleanly");
        }

        let report = writer.drain(&mut window, &results, DrainMode::Final)?;
        writer.flush()?;
        let pool_report = pool_outcome?;

        self.metrics.increment_rows_written(writer.written());
        self.metrics.increment_unresolved(report.unresolved);
        if report.unresolved > 0 {
            error!(
                unresolved = report.unresolved,
                "Rows finished without a verification result"
            );
        }

        let counts = writer.counts();
        let snapshot = self.metrics.snapshot();
        let summary = RunSummary {
            rows_processed: writer.written(),
            exists: counts.exists,
            non_exist: counts.non_exist,
            error: counts.error,
            batches: pool_report.batches,
            retries: snapshot.retry_count,
            degraded_batches: snapshot.degraded_batches,
            unresolved_rows: writer.unresolved(),
            interrupted,
            started_at,
            elapsed: clock.elapsed(),
        };

        info!(
            rows = summary.rows_processed,
            exists = summary.exists,
            non_exist = summary.non_exist,
            error = summary.error,
            batches = summary.batches,
            retries = summary.retries,
            interrupted,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Verification run finished"
        );

        Ok((summary, writer.into_sink()))
    }

    /// Reads the whole source. Returns `true` when stopped by cancellation.
    async fn ingest<Src, Snk>(
        &self,
        source: &mut Src,
        number_position: usize,
        state: &mut RunState<Snk>,
    ) -> Result<bool, RunError>
    where
        Src: RowSource,
        Snk: RowSink,
    {
        let chunk_rows = self.settings.read_chunk_rows.max(1) as u64;

        loop {
            if self.cancel.is_cancelled() {
                warn!(
                    rows = state.window.next_index(),
                    "Cancellation requested, stopping input"
                );
                return Ok(true);
            }

            let index = state.window.next_index();
            let Some(record) = source.next_record() else {
                debug!(rows = index, "Input exhausted");
                return Ok(false);
            };
            let fields = record.map_err(|e| RunError::Read {
                index,
                source: Box::new(e),
            })?;
            self.metrics.increment_rows_read(1);

            let raw = fields.get(number_position).map_or("", String::as_str);
            let canonical = self.normalizer.normalize(raw);
            let row = Row::new(index, fields).with_canonical_number(canonical);

            if row.is_dialable() {
                if let Some(batch) = state.batcher.push_row(&row) {
                    self.dispatch(&mut state.pool, batch).await?;
                }
            } else {
                state.results.record(index, VerificationStatus::Error)?;
            }
            state.window.push(row)?;

            if (index + 1) % chunk_rows == 0 {
                state
                    .writer
                    .drain(&mut state.window, &state.results, DrainMode::Ready)?;
            }

            if state.window.len() >= self.settings.max_pending_rows {
                self.relieve_pressure(state).await?;
            }
        }
    }

    async fn dispatch(&self, pool: &mut WorkerPool, batch: Batch) -> Result<(), RunError> {
        pool.submit(batch).await?;
        self.metrics.increment_dispatched(1);
        Ok(())
    }

    /// Waits until the pending window drops below the cap.
    async fn relieve_pressure<Snk: RowSink>(
        &self,
        state: &mut RunState<Snk>,
    ) -> Result<(), RunError> {
        if let Some(batch) = state.batcher.flush() {
            self.dispatch(&mut state.pool, batch).await?;
        }

        debug!(
            pending = state.window.len(),
            "Pending window full, waiting for results"
        );

        loop {
            state
                .writer
                .drain(&mut state.window, &state.results, DrainMode::Ready)?;
            if state.window.len() < self.settings.max_pending_rows {
                return Ok(());
            }
            if !state.pool.is_alive() {
                return Err(PoolError::QueueClosed.into());
            }

            tokio::select! {
                _ = state.results.changed() => {}
                _ = self.cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(PRESSURE_POLL) => {}
            }
        }
    }
}
