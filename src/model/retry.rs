//! Exponential backoff for transient model failures.

use crate::config::RetrySettings;
use crate::error::{Result, VidmetaError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// When and how long to wait before repeating a failed model call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub attempts: u32,
    pub exp_base: f64,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub http_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            attempts: settings.attempts.max(1),
            exp_base: settings.exp_base.max(1.0),
            initial_delay: Duration::from_secs_f64(settings.initial_delay_secs.max(0.0)),
            max_delay: Duration::from_secs_f64(settings.max_delay_secs.max(0.0)),
            http_status_codes: settings.http_status_codes.clone(),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn none() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `retry` (starting at 1).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(64) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.exp_base.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Whether `error` is a transient model failure under `policy`.
pub fn is_retryable(policy: &RetryPolicy, error: &VidmetaError) -> bool {
    match error {
        VidmetaError::Model {
            status: Some(status),
            ..
        } => policy.http_status_codes.contains(status),
        _ => false,
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts.
///
/// `on_retry` is called with the retry number and the delay before each retry.
pub async fn execute_with_retry<T, Op, Fut, OnRetry>(
    policy: &RetryPolicy,
    mut on_retry: OnRetry,
    mut operation: Op,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    OnRetry: FnMut(u32, Duration),
{
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.attempts && is_retryable(policy, &error) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt,
                    attempts = policy.attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Model request failed with retryable error; retrying"
                );
                on_retry(attempt, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_attempts(attempts)
            .with_initial_delay(Duration::ZERO)
            .with_max_delay(Duration::ZERO)
    }

    fn status_error(status: u16) -> VidmetaError {
        VidmetaError::Model {
            status: Some(status),
            message: format!("HTTP {status}"),
        }
    }

    #[test]
    fn test_delay_grows_by_exp_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(7));
        assert_eq!(policy.delay_for(3), Duration::from_secs(49));
        assert_eq!(policy.delay_for(4), Duration::from_secs(60));
        assert_eq!(policy.delay_for(40), Duration::from_secs(60));
    }

    #[test]
    fn test_only_configured_statuses_are_retryable() {
        let policy = RetryPolicy::default();
        for status in [429, 500, 503, 504] {
            assert!(is_retryable(&policy, &status_error(status)));
        }
        for status in [400, 401, 404, 502] {
            assert!(!is_retryable(&policy, &status_error(status)));
        }
        assert!(!is_retryable(&policy, &VidmetaError::model("connection refused")));
        assert!(!is_retryable(&policy, &VidmetaError::Agent("429".to_string())));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut retries = Vec::new();

        let result = execute_with_retry(
            &fast_policy(5),
            |n, _| retries.push(n),
            || {
                let attempts = Arc::clone(&attempts);
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        return Err(status_error(503));
                    }
                    Ok("done")
                }
            },
        )
        .await;

        assert_eq!(tokio_test::assert_ok!(result), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(retries, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<()> = execute_with_retry(&fast_policy(5), |_, _| {}, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(status_error(429))
            }
        })
        .await;

        let error = tokio_test::assert_err!(result);
        assert_eq!(error.status(), Some(429));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<()> = execute_with_retry(&fast_policy(5), |_, _| {}, || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(status_error(400))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
