use connectors::error::AdapterError;
use engine_config::settings::error::SettingsError;
use engine_processing::error::{PoolError, ResultError, WindowError, WriterError};
use thiserror::Error;

/// Errors that abort a verification run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Setting error.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Adapter-related error.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Failed to read input record {index}: {source}")]
    Read {
        index: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Pending window error: {0}")]
    Window(#[from] WindowError),

    #[error("Result table error: {0}")]
    Results(#[from] ResultError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Output error: {0}")]
    Writer(#[from] WriterError),
}

impl RunError {
    /// True when the input file does not exist.
    pub fn is_input_missing(&self) -> bool {
        matches!(
            self,
            RunError::Adapter(AdapterError::FileError(
                connectors::file::csv::error::FileError::NotFound(_)
            ))
        )
    }
}
