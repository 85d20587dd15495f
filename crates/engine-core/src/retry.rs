use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the retry budget was exhausted.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(err) | RetryError::AttemptsExceeded(err) => err,
        }
    }
}

/// Lifecycle of one operation driven by a [`RetryPolicy`].
///
/// `attempt` is zero-based; terminal states carry the total number of
/// attempts that were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    InFlight { attempt: u32 },
    Backoff { attempt: u32, delay: Duration },
    Succeeded { attempts: u32 },
    Degraded { attempts: u32 },
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Succeeded { .. } | AttemptState::Degraded { .. }
        )
    }
}

/// Events that move an [`AttemptState`] forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptEvent {
    Dispatch,
    Succeeded,
    Failed(RetryDisposition),
    BackoffElapsed,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 6,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff: if max_backoff.is_zero() {
                initial_backoff
            } else {
                max_backoff
            },
        }
    }

    /// Policy that never sleeps, for tests and dry runs.
    pub fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO, Duration::ZERO)
    }

    /// Total number of attempts an always-transient operation receives.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// `min(max_backoff, initial_backoff * 2^attempt)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }

        let factor = 1u128 << attempt.min(64);
        let delay_ms = self.initial_backoff.as_millis().saturating_mul(factor);
        let capped = delay_ms.min(self.max_backoff.as_millis());
        Duration::from_millis(capped as u64)
    }

    /// Pure transition function of the retry state machine.
    ///
    /// Events that do not apply to the current state leave it unchanged.
    pub fn next(&self, state: AttemptState, event: AttemptEvent) -> AttemptState {
        match (state, event) {
            (AttemptState::Pending, AttemptEvent::Dispatch) => {
                AttemptState::InFlight { attempt: 0 }
            }
            (AttemptState::InFlight { attempt }, AttemptEvent::Succeeded) => {
                AttemptState::Succeeded {
                    attempts: attempt + 1,
                }
            }
            (AttemptState::InFlight { attempt }, AttemptEvent::Failed(RetryDisposition::Stop)) => {
                AttemptState::Degraded {
                    attempts: attempt + 1,
                }
            }
            (AttemptState::InFlight { attempt }, AttemptEvent::Failed(RetryDisposition::Retry)) => {
                if attempt >= self.max_retries {
                    AttemptState::Degraded {
                        attempts: attempt + 1,
                    }
                } else {
                    AttemptState::Backoff {
                        attempt,
                        delay: self.backoff_delay(attempt),
                    }
                }
            }
            (AttemptState::Backoff { attempt, .. }, AttemptEvent::BackoffElapsed) => {
                AttemptState::InFlight {
                    attempt: attempt + 1,
                }
            }
            (state, _) => state,
        }
    }

    /// Executes the operation, driving the state machine until it reaches a
    /// terminal state.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut state = self.next(AttemptState::Pending, AttemptEvent::Dispatch);

        loop {
            let err = match op().await {
                Ok(result) => {
                    if let AttemptState::Succeeded { attempts } =
                        self.next(state, AttemptEvent::Succeeded)
                        && attempts > 1
                    {
                        debug!(attempts, "Operation succeeded after retrying");
                    }
                    return Ok(result);
                }
                Err(err) => err,
            };

            let disposition = classify(&err);
            state = self.next(state, AttemptEvent::Failed(disposition));

            match state {
                AttemptState::Backoff { attempt, delay } => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, backing off"
                    );
                    sleep(delay).await;
                    state = self.next(state, AttemptEvent::BackoffElapsed);
                }
                _ => {
                    return Err(match disposition {
                        RetryDisposition::Stop => RetryError::Fatal(err),
                        RetryDisposition::Retry => RetryError::AttemptsExceeded(err),
                    });
                }
            }
        }
    }
}
