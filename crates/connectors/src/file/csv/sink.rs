use crate::{
    file::csv::error::FileError,
    sink::{OutputLayout, RowSink},
};
use csv::WriterBuilder;
use model::records::{
    row::{Columns, Row},
    status::VerificationStatus,
};
use std::{fs::File, io::Write, path::Path};

/// Writes verified rows to CSV, header first.
pub struct CsvRowSink<W: Write> {
    writer: csv::Writer<W>,
    layout: OutputLayout,
    rows_written: u64,
}

impl CsvRowSink<File> {
    pub fn create<P: AsRef<Path>>(
        path: P,
        columns: &Columns,
        status_column: &str,
    ) -> Result<Self, FileError> {
        let file = File::create(path)?;
        Self::from_writer(file, columns, status_column)
    }
}

impl<W: Write> CsvRowSink<W> {
    pub fn from_writer(output: W, columns: &Columns, status_column: &str) -> Result<Self, FileError> {
        let layout = OutputLayout::new(columns, status_column);
        let mut writer = WriterBuilder::new().from_writer(output);
        writer.write_record(layout.header())?;

        Ok(CsvRowSink {
            writer,
            layout,
            rows_written: 0,
        })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn into_inner(self) -> Result<W, FileError> {
        self.writer
            .into_inner()
            .map_err(|e| FileError::WriteError(e.to_string()))
    }
}

impl<W: Write> RowSink for CsvRowSink<W> {
    type Error = FileError;

    fn write_row(&mut self, row: &Row, status: VerificationStatus) -> Result<(), FileError> {
        self.writer.write_record(self.layout.render(row, status))?;
        self.rows_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FileError> {
        self.writer.flush()?;
        Ok(())
    }
}
