use engine_core::retry::RetryPolicy;
use error::SettingsError;
use serde::Serialize;
use std::time::Duration;

pub mod builder;
pub mod error;

pub use builder::SettingsBuilder;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONCURRENCY: usize = 32;
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_MAX_RETRIES: u32 = 6;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_READ_CHUNK_ROWS: usize = 100_000;
pub const DEFAULT_MAX_PENDING_ROWS: usize = 200_000;
pub const DEFAULT_STATUS_COLUMN: &str = "wa_status";

const PLACEHOLDER_TOKEN: &str = "REPLACE_WITH_BEARER_TOKEN";

/// Immutable, validated configuration for one verification run.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Provider base URL; batches are posted to `<base_url>/contacts`
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(skip_serializing)]
    pub token: String,
    /// Upper bound for a single network exchange
    pub request_timeout: Duration,
    /// Number of concurrent verification workers
    pub concurrency: usize,
    /// Work queue capacity; `None` means twice the concurrency
    pub queue_capacity: Option<usize>,
    /// Numbers per provider request
    pub batch_size: usize,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Rows ingested between two opportunistic drains of the writer
    pub read_chunk_rows: usize,
    /// Pending rows at which ingestion waits for results
    pub max_pending_rows: usize,
    /// Input column holding the raw phone number
    pub number_column: String,
    /// Output column receiving the status
    pub status_column: String,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| self.concurrency.saturating_mul(2))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.initial_backoff, self.max_backoff)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.base_url.trim().is_empty() {
            return Err(SettingsError::Missing("base_url"));
        }
        reqwest::Url::parse(&self.base_url).map_err(|e| SettingsError::InvalidValue {
            key: "base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if self.token.trim().is_empty() || self.token == PLACEHOLDER_TOKEN {
            return Err(SettingsError::Missing("token"));
        }

        if self.number_column.is_empty() {
            return Err(SettingsError::Missing("number_column"));
        }
        if self.status_column.is_empty() {
            return Err(SettingsError::Missing("status_column"));
        }

        for (name, value) in [
            ("concurrency", self.concurrency),
            ("batch_size", self.batch_size),
            ("read_chunk_rows", self.read_chunk_rows),
            ("max_pending_rows", self.max_pending_rows),
            ("queue_capacity", self.queue_capacity()),
        ] {
            if value == 0 {
                return Err(SettingsError::Invalid(format!("{name} must be positive")));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(SettingsError::Invalid(
                "request_timeout must be positive".to_string(),
            ));
        }

        if self.max_backoff < self.initial_backoff {
            return Err(SettingsError::Invalid(format!(
                "max_backoff ({:?}) is smaller than initial_backoff ({:?})",
                self.max_backoff, self.initial_backoff
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Settings {
        Settings::builder()
            .base_url("https://waba.example.com/v1")
            .token("secret")
            .number_column("phone")
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let settings = valid();
        assert_eq!(settings.concurrency, 32);
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.max_retries, 6);
        assert_eq!(settings.queue_capacity(), 64);
        assert_eq!(settings.status_column, "wa_status");
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let policy = valid().retry_policy();
        assert_eq!(policy.max_retries, 6);
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_placeholder_token() {
        let mut settings = valid();
        settings.token = "REPLACE_WITH_BEARER_TOKEN".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Missing("token"))
        ));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let mut settings = valid();
        settings.batch_size = 0;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_rejects_inverted_backoff_bounds() {
        let mut settings = valid();
        settings.initial_backoff = Duration::from_secs(10);
        settings.max_backoff = Duration::from_secs(1);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_unparseable_url() {
        let mut settings = valid();
        settings.base_url = "https://your-waba-host:port/v2".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidValue { .. })
        ));
    }
}
