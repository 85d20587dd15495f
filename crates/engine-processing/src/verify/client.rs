use crate::{
    retry::classify_contacts_error,
    verify::status::{degraded, map_response},
};
use async_trait::async_trait;
use connectors::contacts::api::ContactsApi;
use engine_core::{
    metrics::Metrics,
    retry::{RetryError, RetryPolicy},
};
use model::records::status::VerificationResult;
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};
use tracing::{debug, warn};

/// Verifies one batch of canonical numbers.
///
/// Implementations never fail: a batch that cannot be verified resolves
/// every number to `error`.
#[async_trait]
pub trait BatchVerifier: Send + Sync {
    async fn verify(&self, numbers: &[String]) -> VerificationResult;
}

#[async_trait]
impl<V: BatchVerifier + ?Sized> BatchVerifier for Arc<V> {
    async fn verify(&self, numbers: &[String]) -> VerificationResult {
        (**self).verify(numbers).await
    }
}

/// [`BatchVerifier`] backed by the contacts API, with retry and backoff on
/// transient failures.
pub struct ContactsVerifier<A> {
    api: A,
    policy: RetryPolicy,
    metrics: Metrics,
}

impl<A: ContactsApi> ContactsVerifier<A> {
    pub fn new(api: A, policy: RetryPolicy, metrics: Metrics) -> Self {
        ContactsVerifier {
            api,
            policy,
            metrics,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

#[async_trait]
impl<A: ContactsApi> BatchVerifier for ContactsVerifier<A> {
    async fn verify(&self, numbers: &[String]) -> VerificationResult {
        if numbers.is_empty() {
            return VerificationResult::new();
        }

        let attempts = AtomicU32::new(0);
        let outcome = self
            .policy
            .run(
                || {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    self.api.check_contacts(numbers)
                },
                classify_contacts_error,
            )
            .await;

        let attempts = attempts.into_inner();
        self.metrics
            .increment_retries(u64::from(attempts.saturating_sub(1)));

        match outcome {
            Ok(response) => {
                debug!(
                    numbers = numbers.len(),
                    reported = response.contacts.len(),
                    attempts,
                    "Batch verified"
                );
                map_response(numbers, &response)
            }
            Err(err) => {
                let reason = match &err {
                    RetryError::Fatal(_) => "permanent failure",
                    RetryError::AttemptsExceeded(_) => "retry budget exhausted",
                };
                let err = err.into_inner();
                warn!(
                    numbers = numbers.len(),
                    attempts,
                    reason,
                    error = %err,
                    "Batch degraded to error"
                );
                self.metrics.increment_degraded(1);
                degraded(numbers)
            }
        }
    }
}
