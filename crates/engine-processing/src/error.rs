use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResultError {
    #[error("Status for row {index} was already recorded")]
    AlreadyRecorded { index: u64 },
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Row {got} pushed out of order, expected row {expected}")]
    OutOfOrder { expected: u64, got: u64 },
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("The work queue was closed: every worker has exited")]
    QueueClosed,

    #[error("Worker {worker} failed: {source}")]
    Worker {
        worker: usize,
        #[source]
        source: ResultError,
    },

    #[error("Worker task failed to complete: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Only {acknowledged} of {enqueued} work items were acknowledged")]
    Unacknowledged { acknowledged: u64, enqueued: u64 },
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("Failed to write row {index}: {source}")]
    Sink {
        index: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to flush output: {0}")]
    Flush(#[source] Box<dyn std::error::Error + Send + Sync>),
}
