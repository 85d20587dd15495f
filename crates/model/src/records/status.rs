use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

/// Outcome recorded for every input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Exists,
    NonExist,
    Error,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Exists => "exists",
            VerificationStatus::NonExist => "non_exist",
            VerificationStatus::Error => "error",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown verification status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for VerificationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exists" => Ok(VerificationStatus::Exists),
            "non_exist" => Ok(VerificationStatus::NonExist),
            "error" => Ok(VerificationStatus::Error),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Per-number statuses produced by one batch verification.
pub type VerificationResult = HashMap<String, VerificationStatus>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_output_tokens() {
        assert_eq!(VerificationStatus::Exists.to_string(), "exists");
        assert_eq!(VerificationStatus::NonExist.to_string(), "non_exist");
        assert_eq!(VerificationStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "non_exist".parse::<VerificationStatus>().unwrap(),
            VerificationStatus::NonExist
        );
        assert!("unknown".parse::<VerificationStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&VerificationStatus::NonExist).unwrap();
        assert_eq!(json, "\"non_exist\"");
    }
}
