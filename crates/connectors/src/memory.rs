//! In-memory row collaborators for embedding the pipeline and for tests.

use crate::{
    sink::{OutputLayout, RowSink},
    source::RowSource,
};
use model::records::{
    row::{Columns, Row},
    status::VerificationStatus,
};
use std::{collections::VecDeque, convert::Infallible};

pub struct VecRowSource {
    columns: Columns,
    records: VecDeque<Vec<String>>,
}

impl VecRowSource {
    pub fn new(columns: Columns, records: Vec<Vec<String>>) -> Self {
        Self {
            columns,
            records: records.into(),
        }
    }

    /// Single-column source, handy when only the number matters.
    pub fn numbers<I, S>(column: &str, numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            Columns::new([column]),
            numbers.into_iter().map(|n| vec![n.into()]).collect(),
        )
    }
}

impl RowSource for VecRowSource {
    type Error = Infallible;

    fn columns(&self) -> &Columns {
        &self.columns
    }

    fn next_record(&mut self) -> Option<Result<Vec<String>, Infallible>> {
        self.records.pop_front().map(Ok)
    }
}

/// Collects rendered output rows together with the index each came from.
#[derive(Debug)]
pub struct VecRowSink {
    layout: OutputLayout,
    rows: Vec<Vec<String>>,
    written: Vec<(u64, VerificationStatus)>,
    flushes: usize,
}

impl VecRowSink {
    pub fn new(columns: &Columns, status_column: &str) -> Self {
        Self {
            layout: OutputLayout::new(columns, status_column),
            rows: Vec::new(),
            written: Vec::new(),
            flushes: 0,
        }
    }

    pub fn header(&self) -> &[String] {
        self.layout.header()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// `(index, status)` pairs in write order.
    pub fn written(&self) -> &[(u64, VerificationStatus)] {
        &self.written
    }

    pub fn statuses(&self) -> Vec<VerificationStatus> {
        self.written.iter().map(|(_, s)| *s).collect()
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl RowSink for VecRowSink {
    type Error = Infallible;

    fn write_row(&mut self, row: &Row, status: VerificationStatus) -> Result<(), Infallible> {
        self.rows.push(
            self.layout
                .render(row, status)
                .into_iter()
                .map(str::to_string)
                .collect(),
        );
        self.written.push((row.index, status));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        self.flushes += 1;
        Ok(())
    }
}
