use crate::error::CliError;
use clap::{Args, Subcommand};
use engine_config::{
    env::EnvVars,
    settings::{Settings, builder::SettingsBuilder},
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Subcommand)]
pub enum Commands {
    /// Check every number of a CSV file against the contacts endpoint
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input CSV file with a header row
    pub input: PathBuf,

    /// Column holding the phone number
    pub number_column: String,

    /// Output CSV file; existing files are overwritten
    pub output: PathBuf,

    #[arg(long, help = "Contacts API base URL (WABA_BASE_URL)")]
    pub base_url: Option<String>,

    #[arg(long, help = "Bearer token (WABA_TOKEN)")]
    pub token: Option<String>,

    #[arg(long, help = "Concurrent requests")]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Numbers per request")]
    pub batch_size: Option<usize>,

    #[arg(long, help = "Retries for transient failures")]
    pub max_retries: Option<u32>,

    #[arg(long, help = "First backoff delay in milliseconds")]
    pub initial_backoff_ms: Option<u64>,

    #[arg(long, help = "Backoff ceiling in milliseconds")]
    pub max_backoff_ms: Option<u64>,

    #[arg(long, help = "Per-request timeout in seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Rows read between two writer drains")]
    pub chunk_rows: Option<usize>,

    #[arg(long, help = "Rows buffered before reading pauses")]
    pub max_pending_rows: Option<usize>,

    #[arg(long, help = "Name of the status column in the output")]
    pub status_column: Option<String>,

    #[arg(long, help = "Env file to load; defaults to ./.env when present")]
    pub env_file: Option<PathBuf>,

    #[arg(long, help = "Write a JSON run summary to this file")]
    pub report: Option<PathBuf>,
}

impl ValidateArgs {
    /// Defaults, then process environment, then the env file, then flags.
    pub fn settings(&self) -> Result<Settings, CliError> {
        let mut env = EnvVars::from_process();
        match &self.env_file {
            Some(path) => env.load_file(path)?,
            None if Path::new(DEFAULT_ENV_FILE).is_file() => env.load_file(DEFAULT_ENV_FILE)?,
            None => debug!("No env file found"),
        }

        let settings = SettingsBuilder::from_env(&env)?
            .merge(self.overrides())
            .build()?;
        Ok(settings)
    }

    fn overrides(&self) -> SettingsBuilder {
        SettingsBuilder {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            request_timeout: self.timeout_secs.map(Duration::from_secs),
            concurrency: self.concurrency,
            queue_capacity: None,
            batch_size: self.batch_size,
            max_retries: self.max_retries,
            initial_backoff: self.initial_backoff_ms.map(Duration::from_millis),
            max_backoff: self.max_backoff_ms.map(Duration::from_millis),
            read_chunk_rows: self.chunk_rows,
            max_pending_rows: self.max_pending_rows,
            number_column: Some(self.number_column.clone()),
            status_column: self.status_column.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;
    use std::io::Write;

    fn parse(args: &[&str]) -> ValidateArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Validate(args) => args,
        }
    }

    #[test]
    fn test_positional_arguments() {
        let args = parse(&["wa-validator", "validate", "in.csv", "phone", "out.csv"]);
        assert_eq!(args.input, PathBuf::from("in.csv"));
        assert_eq!(args.number_column, "phone");
        assert_eq!(args.output, PathBuf::from("out.csv"));
        assert!(args.report.is_none());
    }

    #[test]
    fn test_flags_override_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "WABA_BASE_URL=https://env.example.com/v1").unwrap();
        writeln!(file, "WABA_TOKEN=from-file").unwrap();
        writeln!(file, "WA_BATCH_SIZE=20").unwrap();

        let env_file = file.path().to_str().unwrap().to_string();
        let args = parse(&[
            "wa-validator",
            "validate",
            "in.csv",
            "msisdn",
            "out.csv",
            "--env-file",
            &env_file,
            "--batch-size",
            "10",
            "--initial-backoff-ms",
            "200",
            "--max-backoff-ms",
            "800",
        ]);

        let settings = args.settings().unwrap();
        assert_eq!(settings.base_url, "https://env.example.com/v1");
        assert_eq!(settings.token, "from-file");
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.number_column, "msisdn");
        assert_eq!(settings.initial_backoff, Duration::from_millis(200));
        assert_eq!(settings.max_backoff, Duration::from_millis(800));
    }

    #[test]
    fn test_missing_positional_is_usage_error() {
        assert!(Cli::try_parse_from(["wa-validator", "validate", "in.csv"]).is_err());
    }
}
