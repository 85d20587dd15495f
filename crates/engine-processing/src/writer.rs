use crate::{
    error::{WindowError, WriterError},
    results::ResultTable,
};
use connectors::sink::RowSink;
use model::records::{row::Row, status::VerificationStatus};
use std::collections::VecDeque;
use tracing::{debug, error};

/// Unflushed rows, ordered by index and contiguous from the cursor.
#[derive(Debug, Default)]
pub struct PendingWindow {
    rows: VecDeque<Row>,
    cursor: u64,
}

impl PendingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row; its index must directly follow the last buffered one.
    pub fn push(&mut self, row: Row) -> Result<(), WindowError> {
        let expected = self.next_index();
        if row.index != expected {
            return Err(WindowError::OutOfOrder {
                expected,
                got: row.index,
            });
        }
        self.rows.push_back(row);
        Ok(())
    }

    /// Index of the next row to be written.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Index the next pushed row must carry.
    pub fn next_index(&self) -> u64 {
        self.cursor + self.rows.len() as u64
    }

    pub fn head(&self) -> Option<&Row> {
        self.rows.front()
    }

    pub fn pop_head(&mut self) -> Option<Row> {
        let row = self.rows.pop_front()?;
        self.cursor += 1;
        Some(row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Per-status tally of written rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub exists: u64,
    pub non_exist: u64,
    pub error: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: VerificationStatus) {
        match status {
            VerificationStatus::Exists => self.exists += 1,
            VerificationStatus::NonExist => self.non_exist += 1,
            VerificationStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.exists + self.non_exist + self.error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Stop at the first row whose result has not arrived.
    Ready,
    /// Write everything; rows still lacking a result are written as `error`.
    Final,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub cursor: u64,
    pub written: u64,
    pub unresolved: u64,
}

/// Writes rows to the sink strictly in index order.
pub struct OrderedWriter<S> {
    sink: S,
    counts: StatusCounts,
    unresolved: u64,
}

impl<S> OrderedWriter<S>
where
    S: RowSink,
{
    pub fn new(sink: S) -> Self {
        OrderedWriter {
            sink,
            counts: StatusCounts::default(),
            unresolved: 0,
        }
    }

    pub fn drain(
        &mut self,
        window: &mut PendingWindow,
        results: &ResultTable,
        mode: DrainMode,
    ) -> Result<DrainReport, WriterError> {
        let mut report = DrainReport::default();

        while let Some(head) = window.head() {
            let status = if !head.is_dialable() {
                VerificationStatus::Error
            } else if let Some(status) = results.get(head.index) {
                status
            } else if mode == DrainMode::Final {
                error!(row = head.index, "No verification result for row, writing error");
                report.unresolved += 1;
                VerificationStatus::Error
            } else {
                break;
            };

            self.sink
                .write_row(head, status)
                .map_err(|e| WriterError::Sink {
                    index: head.index,
                    source: Box::new(e),
                })?;
            window.pop_head();
            self.counts.record(status);
            report.written += 1;
        }

        report.cursor = window.cursor();
        self.unresolved += report.unresolved;

        if report.written > 0 {
            debug!(
                written = report.written,
                cursor = report.cursor,
                pending = window.len(),
                "Drained ready rows"
            );
        }
        Ok(report)
    }

    pub fn flush(&mut self) -> Result<(), WriterError> {
        self.sink
            .flush()
            .map_err(|e| WriterError::Flush(Box::new(e)))
    }

    pub fn counts(&self) -> StatusCounts {
        self.counts
    }

    pub fn written(&self) -> u64 {
        self.counts.total()
    }

    pub fn unresolved(&self) -> u64 {
        self.unresolved
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
