use model::records::row::Columns;

/// Ordered, one-pass supplier of input records.
pub trait RowSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Column names, in the order record values are returned.
    fn columns(&self) -> &Columns;

    /// Values of the next record aligned with [`RowSource::columns`];
    /// `None` once the input is exhausted.
    fn next_record(&mut self) -> Option<Result<Vec<String>, Self::Error>>;
}
