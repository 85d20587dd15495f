use connectors::contacts::error::{ContactsError, is_transient_status};
use engine_core::retry::RetryDisposition;

pub fn classify_contacts_error(err: &ContactsError) -> RetryDisposition {
    match err {
        ContactsError::Status { code, .. } if is_transient_status(*code) => {
            RetryDisposition::Retry
        }
        ContactsError::Status { .. } => RetryDisposition::Stop,
        ContactsError::Timeout(_) | ContactsError::Connect(_) | ContactsError::Transport(_) => {
            RetryDisposition::Retry
        }
        ContactsError::Decode(_) => RetryDisposition::Stop,
        ContactsError::InvalidEndpoint { .. } => RetryDisposition::Stop,
        ContactsError::ClientBuild(_) => RetryDisposition::Stop,
    }
}
