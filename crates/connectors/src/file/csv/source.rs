use crate::{file::csv::error::FileError, source::RowSource};
use csv::{ReaderBuilder, StringRecord};
use model::records::row::Columns;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, warn};

const UTF8_BOM: char = '\u{feff}';

/// Streams records from a CSV file with a header row.
pub struct CsvRowSource<R: Read> {
    reader: csv::Reader<R>,
    columns: Columns,
    record: StringRecord,
    /// Tracks how many records have been consumed from the file.
    rows_read: u64,
}

impl CsvRowSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FileError::NotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvRowSource<R> {
    pub fn from_reader(input: R) -> Result<Self, FileError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(FileError::MissingHeader);
        }

        let columns = Columns::new(headers.iter().enumerate().map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches(UTF8_BOM).to_string()
            } else {
                h.to_string()
            }
        }));
        debug!(columns = ?columns.names(), "CSV header read");

        Ok(CsvRowSource {
            reader,
            columns,
            record: StringRecord::new(),
            rows_read: 0,
        })
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }
}

impl<R: Read> RowSource for CsvRowSource<R> {
    type Error = FileError;

    fn columns(&self) -> &Columns {
        &self.columns
    }

    fn next_record(&mut self) -> Option<Result<Vec<String>, FileError>> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Err(e) => Some(Err(FileError::CsvError(e))),
            Ok(true) => {
                self.rows_read += 1;
                let width = self.columns.len();
                if self.record.len() > width {
                    warn!(
                        line = self.rows_read + 1,
                        fields = self.record.len(),
                        columns = width,
                        "Record has more fields than the header; extra fields dropped"
                    );
                }

                let mut values: Vec<String> =
                    self.record.iter().take(width).map(str::to_string).collect();
                values.resize(width, String::new());
                Some(Ok(values))
            }
        }
    }
}
