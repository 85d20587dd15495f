use thiserror::Error;

/// Status codes that signal throttling or temporary unavailability.
pub const TRANSIENT_STATUS_CODES: [u16; 4] = [429, 502, 503, 504];

pub fn is_transient_status(code: u16) -> bool {
    TRANSIENT_STATUS_CODES.contains(&code)
}

#[derive(Debug, Error)]
pub enum ContactsError {
    /// The provider answered with an error status code.
    #[error("Provider responded with HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending the request or reading the reply.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A success response whose body is not the expected JSON document.
    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Invalid contacts endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl From<reqwest::Error> for ContactsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ContactsError::Timeout(err.to_string())
        } else if err.is_connect() {
            ContactsError::Connect(err.to_string())
        } else if err.is_decode() {
            ContactsError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ContactsError::Status {
                code: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ContactsError::Transport(err.to_string())
        }
    }
}
