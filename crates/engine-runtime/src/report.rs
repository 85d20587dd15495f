use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Outcome of one verification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub rows_processed: u64,
    pub exists: u64,
    pub non_exist: u64,
    pub error: u64,
    pub batches: u64,
    pub retries: u64,
    pub degraded_batches: u64,
    pub unresolved_rows: u64,
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}
