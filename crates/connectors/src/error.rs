use crate::{contacts::error::ContactsError, file::csv::error::FileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// File-related error.
    #[error("File error: {0}")]
    FileError(#[from] FileError),

    /// Contacts provider could not be set up.
    #[error("Contacts provider error: {0}")]
    Contacts(#[from] ContactsError),

    /// A column the run depends on is absent from the input.
    #[error("Column '{0}' not found in input header")]
    MissingColumn(String),
}
