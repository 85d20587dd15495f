use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    rows_read: AtomicU64,
    rows_written: AtomicU64,
    batches_dispatched: AtomicU64,
    batches_verified: AtomicU64,
    retry_count: AtomicU64,
    degraded_batches: AtomicU64,
    unresolved_rows: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub rows_read: u64,
    pub rows_written: u64,
    pub batches_dispatched: u64,
    pub batches_verified: u64,
    pub retry_count: u64,
    pub degraded_batches: u64,
    pub unresolved_rows: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_rows_read(&self, count: u64) {
        self.inner.rows_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_written(&self, count: u64) {
        self.inner.rows_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_dispatched(&self, count: u64) {
        self.inner
            .batches_dispatched
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_verified(&self, count: u64) {
        self.inner
            .batches_verified
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_degraded(&self, count: u64) {
        self.inner
            .degraded_batches
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_unresolved(&self, count: u64) {
        self.inner
            .unresolved_rows
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_read: self.inner.rows_read.load(Ordering::Relaxed),
            rows_written: self.inner.rows_written.load(Ordering::Relaxed),
            batches_dispatched: self.inner.batches_dispatched.load(Ordering::Relaxed),
            batches_verified: self.inner.batches_verified.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
            degraded_batches: self.inner.degraded_batches.load(Ordering::Relaxed),
            unresolved_rows: self.inner.unresolved_rows.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
