use super::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF,
    DEFAULT_MAX_PENDING_ROWS, DEFAULT_MAX_RETRIES, DEFAULT_READ_CHUNK_ROWS,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_STATUS_COLUMN, Settings, error::SettingsError,
};
use crate::env::EnvVars;
use std::{str::FromStr, time::Duration};
use tracing::debug;

pub const ENV_BASE_URL: &str = "WABA_BASE_URL";
pub const ENV_TOKEN: &str = "WABA_TOKEN";
pub const ENV_CONCURRENCY: &str = "WA_CONCURRENT_REQUESTS";
pub const ENV_QUEUE_CAPACITY: &str = "WA_QUEUE_CAPACITY";
pub const ENV_BATCH_SIZE: &str = "WA_BATCH_SIZE";
pub const ENV_MAX_RETRIES: &str = "WA_MAX_RETRIES";
pub const ENV_INITIAL_BACKOFF_MS: &str = "WA_INITIAL_BACKOFF_MS";
pub const ENV_MAX_BACKOFF_MS: &str = "WA_MAX_BACKOFF_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "WA_REQUEST_TIMEOUT_SECS";
pub const ENV_READ_CHUNK_ROWS: &str = "WA_READ_CHUNK_ROWS";
pub const ENV_MAX_PENDING_ROWS: &str = "WA_MAX_PENDING_ROWS";
pub const ENV_NUMBER_COLUMN: &str = "WA_NUMBER_COLUMN";
pub const ENV_STATUS_COLUMN: &str = "WA_STATUS_COLUMN";

/// Partially specified settings. Every layer (environment, env file,
/// command line) produces one of these and later layers win on `merge`.
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub request_timeout: Option<Duration>,
    pub concurrency: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub batch_size: Option<usize>,
    pub max_retries: Option<u32>,
    pub initial_backoff: Option<Duration>,
    pub max_backoff: Option<Duration>,
    pub read_chunk_rows: Option<usize>,
    pub max_pending_rows: Option<usize>,
    pub number_column: Option<String>,
    pub status_column: Option<String>,
}

impl SettingsBuilder {
    pub fn from_env(env: &EnvVars) -> Result<Self, SettingsError> {
        let builder = Self {
            base_url: env.get(ENV_BASE_URL).map(str::to_string),
            token: env.get(ENV_TOKEN).map(str::to_string),
            request_timeout: parse_var::<u64>(env, ENV_REQUEST_TIMEOUT_SECS)?
                .map(Duration::from_secs),
            concurrency: parse_var(env, ENV_CONCURRENCY)?,
            queue_capacity: parse_var(env, ENV_QUEUE_CAPACITY)?,
            batch_size: parse_var(env, ENV_BATCH_SIZE)?,
            max_retries: parse_var(env, ENV_MAX_RETRIES)?,
            initial_backoff: parse_var::<u64>(env, ENV_INITIAL_BACKOFF_MS)?
                .map(Duration::from_millis),
            max_backoff: parse_var::<u64>(env, ENV_MAX_BACKOFF_MS)?.map(Duration::from_millis),
            read_chunk_rows: parse_var(env, ENV_READ_CHUNK_ROWS)?,
            max_pending_rows: parse_var(env, ENV_MAX_PENDING_ROWS)?,
            number_column: env.get(ENV_NUMBER_COLUMN).map(str::to_string),
            status_column: env.get(ENV_STATUS_COLUMN).map(str::to_string),
        };
        debug!(
            concurrency = ?builder.concurrency,
            batch_size = ?builder.batch_size,
            "Loaded settings from environment"
        );
        Ok(builder)
    }

    /// Overlays `other` on top of `self`.
    pub fn merge(self, other: SettingsBuilder) -> Self {
        Self {
            base_url: other.base_url.or(self.base_url),
            token: other.token.or(self.token),
            request_timeout: other.request_timeout.or(self.request_timeout),
            concurrency: other.concurrency.or(self.concurrency),
            queue_capacity: other.queue_capacity.or(self.queue_capacity),
            batch_size: other.batch_size.or(self.batch_size),
            max_retries: other.max_retries.or(self.max_retries),
            initial_backoff: other.initial_backoff.or(self.initial_backoff),
            max_backoff: other.max_backoff.or(self.max_backoff),
            read_chunk_rows: other.read_chunk_rows.or(self.read_chunk_rows),
            max_pending_rows: other.max_pending_rows.or(self.max_pending_rows),
            number_column: other.number_column.or(self.number_column),
            status_column: other.status_column.or(self.status_column),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = Some(initial);
        self.max_backoff = Some(max);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn read_chunk_rows(mut self, rows: usize) -> Self {
        self.read_chunk_rows = Some(rows);
        self
    }

    pub fn max_pending_rows(mut self, rows: usize) -> Self {
        self.max_pending_rows = Some(rows);
        self
    }

    pub fn number_column(mut self, column: impl Into<String>) -> Self {
        self.number_column = Some(column.into());
        self
    }

    pub fn status_column(mut self, column: impl Into<String>) -> Self {
        self.status_column = Some(column.into());
        self
    }

    /// Fills in defaults and validates the result.
    pub fn build(self) -> Result<Settings, SettingsError> {
        let settings = Settings {
            base_url: self.base_url.ok_or(SettingsError::Missing("base_url"))?,
            token: self.token.ok_or(SettingsError::Missing("token"))?,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            concurrency: self.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            queue_capacity: self.queue_capacity,
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            initial_backoff: self.initial_backoff.unwrap_or(DEFAULT_INITIAL_BACKOFF),
            max_backoff: self.max_backoff.unwrap_or(DEFAULT_MAX_BACKOFF),
            read_chunk_rows: self.read_chunk_rows.unwrap_or(DEFAULT_READ_CHUNK_ROWS),
            max_pending_rows: self.max_pending_rows.unwrap_or(DEFAULT_MAX_PENDING_ROWS),
            number_column: self
                .number_column
                .ok_or(SettingsError::Missing("number_column"))?,
            status_column: self
                .status_column
                .unwrap_or_else(|| DEFAULT_STATUS_COLUMN.to_string()),
        };

        settings.validate()?;
        Ok(settings)
    }
}

fn parse_var<T>(env: &EnvVars, key: &str) -> Result<Option<T>, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SettingsError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            }),
    }
}
