use crate::shutdown::ExitCode;
use engine_config::settings::error::SettingsError;
use engine_runtime::error::RunError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Settings(#[from] SettingsError),

    #[error("Validation run failed: {0}")]
    Runner(#[from] RunError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Failed to write the report: {0}")]
    ReportWrite(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InputNotFound(_) => ExitCode::InputNotFound,
            CliError::Runner(err) if err.is_input_missing() => ExitCode::InputNotFound,
            _ => ExitCode::GeneralError,
        }
    }
}
