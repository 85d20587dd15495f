use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling or validating the run configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required setting was not supplied by any source.
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// A setting was supplied but could not be parsed.
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The combination of settings is inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid env file: {0}")]
    MalformedEnvFile(String),
}
