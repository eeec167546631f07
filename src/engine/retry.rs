//! Attempt-bounded exponential backoff shared by authentication and booking calls.

use crate::error::{AuthenticationError, BookingError, IsRetryable};
use backon::{ExponentialBuilder, Retryable};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_DELAY: Duration = Duration::from_secs(60 * 60);

/// Errors a [`RetryPolicy`] can drive.
pub trait RetryError: IsRetryable + Display + Sized {
    /// Terminal error returned when the policy allows no attempt at all.
    fn no_attempts(max_attempts: usize) -> Self;
}

impl RetryError for AuthenticationError {
    fn no_attempts(max_attempts: usize) -> Self {
        AuthenticationError::Generic(format!("max_attempts must be at least 1, got {max_attempts}"))
    }
}

impl RetryError for BookingError {
    fn no_attempts(max_attempts: usize) -> Self {
        BookingError::InvalidConfig(format!("max_attempts must be at least 1, got {max_attempts}"))
    }
}

/// Calls an operation up to `max_attempts` times, sleeping `2^attempt` seconds after the
/// `attempt`-th failure (2s, 4s, 8s, ...). Failures whose [`IsRetryable::is_retryable`] is false
/// end the loop immediately.
///
/// Sleeps are plain tokio timers: dropping the returned future (timeout, `select!`) cancels a
/// pending backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_secs(2),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(2.0)
            .with_max_delay(MAX_DELAY)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }

    pub async fn run<T, E, F, Fut>(&self, operation: &str, op: F) -> Result<T, E>
    where
        E: RetryError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.max_attempts < 1 {
            return Err(E::no_attempts(self.max_attempts));
        }

        let mut attempt = 0usize;
        op.retry(self.backoff())
            .when(|e: &E| e.is_retryable())
            .notify(|e: &E, delay: Duration| {
                attempt += 1;
                warn!(
                    operation,
                    attempt,
                    max_attempts = self.max_attempts,
                    delay = ?delay,
                    error = %e,
                    "Attempt failed, backing off"
                );
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn generic_failures_use_every_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let res: Result<(), _> = RetryPolicy::new(4)
            .run("authenticate", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(AuthenticationError::Generic("down".to_string())) }
            })
            .await;

        assert_eq!(res, Err(AuthenticationError::Generic("down".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_credentials_stop_after_one_call() {
        for max_attempts in [1, 3, 10] {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = calls.clone();
            let res: Result<(), _> = RetryPolicy::new(max_attempts)
                .run("authenticate", || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Err(AuthenticationError::InvalidCredentials) }
                })
                .await;

            assert_eq!(res, Err(AuthenticationError::InvalidCredentials));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn temporary_block_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let res: Result<(), _> = RetryPolicy::new(5)
            .run("authenticate", || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(AuthenticationError::TemporarilyBlocked("15 min".to_string())) }
            })
            .await;

        assert!(matches!(res, Err(AuthenticationError::TemporarilyBlocked(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_double_from_two_seconds() {
        let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorder = stamps.clone();
        let res = RetryPolicy::new(5)
            .run("book", || {
                let n = {
                    let mut stamps = recorder.lock().unwrap();
                    stamps.push(Instant::now());
                    stamps.len()
                };
                async move {
                    if n < 4 {
                        Err(BookingError::Generic("flaky".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(res, Ok(4));
        let stamps = stamps.lock().unwrap();
        let gaps: Vec<Duration> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn zero_attempts_is_a_terminal_error_without_calls() {
        let calls = AtomicUsize::new(0);
        let auth: Result<(), AuthenticationError> = RetryPolicy::new(0)
            .run("authenticate", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;
        let book: Result<(), BookingError> = RetryPolicy::new(0)
            .run("book", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        assert!(matches!(auth, Err(AuthenticationError::Generic(_))));
        assert!(matches!(book, Err(BookingError::InvalidConfig(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
