use connectors::contacts::protocol::ContactsResponse;
use model::records::status::{VerificationResult, VerificationStatus};
use std::collections::HashMap;

/// Maps a provider status token onto the three output statuses.
pub fn map_provider_status(token: &str) -> VerificationStatus {
    match token.trim().to_ascii_lowercase().as_str() {
        "valid" | "processing" | "pending" => VerificationStatus::Exists,
        "invalid" | "failed" => VerificationStatus::NonExist,
        _ => VerificationStatus::Error,
    }
}

/// Resolves every requested number against the provider reply. Numbers the
/// provider did not mention resolve to `error`.
pub fn map_response(numbers: &[String], response: &ContactsResponse) -> VerificationResult {
    let reported: HashMap<&str, VerificationStatus> = response
        .contacts
        .iter()
        .filter_map(|entry| {
            let input = entry.input.as_deref()?;
            let status = entry
                .status
                .as_deref()
                .map_or(VerificationStatus::Error, map_provider_status);
            Some((input, status))
        })
        .collect();

    numbers
        .iter()
        .map(|number| {
            let status = reported
                .get(number.as_str())
                .copied()
                .unwrap_or(VerificationStatus::Error);
            (number.clone(), status)
        })
        .collect()
}

/// Every number resolved to `error`, for batches that could not be verified.
pub fn degraded(numbers: &[String]) -> VerificationResult {
    numbers
        .iter()
        .map(|number| (number.clone(), VerificationStatus::Error))
        .collect()
}
