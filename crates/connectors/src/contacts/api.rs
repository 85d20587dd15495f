use crate::contacts::{
    error::ContactsError,
    protocol::{ContactsRequest, ContactsResponse},
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

const CONTACTS_PATH: &str = "contacts";
const MAX_ERROR_BODY: usize = 512;

/// One network exchange with the contacts provider for a batch of numbers.
#[async_trait]
pub trait ContactsApi: Send + Sync {
    async fn check_contacts(&self, numbers: &[String]) -> Result<ContactsResponse, ContactsError>;
}

/// Contacts API over HTTPS with bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpContactsApi {
    client: Client,
    url: Url,
    token: String,
}

impl HttpContactsApi {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
        max_connections: usize,
    ) -> Result<Self, ContactsError> {
        let url = contacts_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(max_connections)
            .build()
            .map_err(|e| ContactsError::ClientBuild(e.to_string()))?;

        Ok(HttpContactsApi {
            client,
            url,
            token: token.into(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ContactsApi for HttpContactsApi {
    async fn check_contacts(&self, numbers: &[String]) -> Result<ContactsResponse, ContactsError> {
        debug!(url = %self.url, numbers = numbers.len(), "Posting contacts batch");

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(&ContactsRequest::wait(numbers))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(ContactsError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<ContactsResponse>().await?)
    }
}

/// `<base_url>/contacts`, tolerating a trailing slash on the base.
pub fn contacts_url(base_url: &str) -> Result<Url, ContactsError> {
    let joined = format!("{}/{CONTACTS_PATH}", base_url.trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| ContactsError::InvalidEndpoint {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contacts_url_joins_path() {
        assert_eq!(
            contacts_url("https://waba.example.com/v2").unwrap().as_str(),
            "https://waba.example.com/v2/contacts"
        );
        assert_eq!(
            contacts_url("https://waba.example.com/v2/").unwrap().as_str(),
            "https://waba.example.com/v2/contacts"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = contacts_url("https://your-waba-host:port/v2").unwrap_err();
        assert!(matches!(err, ContactsError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_connection_error() {
        // Port 9 on localhost is "discard"; nothing should be listening.
        let api = HttpContactsApi::new(
            "http://127.0.0.1:9",
            "token",
            Duration::from_secs(2),
            1,
        )
        .unwrap();

        let err = api
            .check_contacts(&["+1".to_string()])
            .await
            .unwrap_err();
        assert!(
            matches!(err, ContactsError::Connect(_) | ContactsError::Timeout(_)),
            "unexpected error: {err:?}"
        );
    }
}
