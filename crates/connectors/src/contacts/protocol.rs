use serde::{Deserialize, Serialize};

/// Body of a contacts check request.
///
/// `blocking = "wait"` asks the provider to resolve every number before
/// replying instead of returning `processing` placeholders.
#[derive(Debug, Serialize)]
pub struct ContactsRequest<'a> {
    pub blocking: &'static str,
    pub contacts: &'a [String],
}

impl<'a> ContactsRequest<'a> {
    pub fn wait(contacts: &'a [String]) -> Self {
        ContactsRequest {
            blocking: "wait",
            contacts,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactsResponse {
    #[serde(default)]
    pub contacts: Vec<ContactEntry>,
}

/// Per-number entry in a provider reply. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactEntry {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ContactEntry {
    pub fn new(input: impl Into<String>, status: impl Into<String>) -> Self {
        ContactEntry {
            input: Some(input.into()),
            status: Some(status.into()),
        }
    }
}

impl ContactsResponse {
    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        ContactsResponse {
            contacts: pairs
                .into_iter()
                .map(|(input, status)| ContactEntry::new(input, status))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let numbers = vec!["+1234567890".to_string(), "+44123".to_string()];
        let body = serde_json::to_value(ContactsRequest::wait(&numbers)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"blocking": "wait", "contacts": ["+1234567890", "+44123"]})
        );
    }

    #[test]
    fn test_response_ignores_unknown_fields() {
        let raw = r#"{
            "contacts": [
                {"input": "+1234567890", "status": "valid", "wa_id": "1234567890"},
                {"input": "+44123", "status": "invalid"}
            ],
            "meta": {"api_status": "stable"}
        }"#;

        let response: ContactsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            response,
            ContactsResponse::from_pairs([("+1234567890", "valid"), ("+44123", "invalid")])
        );
    }

    #[test]
    fn test_response_without_contacts_is_empty() {
        let response: ContactsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.contacts.is_empty());

        let partial: ContactsResponse =
            serde_json::from_str(r#"{"contacts": [{"input": "+1"}]}"#).unwrap();
        assert_eq!(partial.contacts[0].status, None);
    }
}
