//! Retry wrapper for Shopify Admin API calls.
//!
//! Only rate-limit failures (HTTP 429, GraphQL `THROTTLED`) are retried. The
//! wait before each retry is the server's `Retry-After` value when one was
//! sent, otherwise [`RetryPolicy::default_retry_after`]. Every other failure,
//! including transport errors that never produced a response, is returned on
//! the first attempt.
//!
//! | Attempt | Before next attempt                          |
//! |---------|----------------------------------------------|
//! | 1       | sleep `Retry-After` (or default), capped     |
//! | 2       | sleep `Retry-After` (or default), capped     |
//! | 3       | last attempt; the rate-limit error surfaces  |
//!
//! With `max_attempts = 3` the operation runs at most 3 times.

use std::future::Future;
use std::time::Duration;

use vendorsync_core::AppConfig;

use crate::pacing::pause;

/// Failure classifier used by [`retry_with_backoff`].
pub trait RateLimitSignal {
    /// `true` when the upstream asked us to slow down.
    fn is_rate_limited(&self) -> bool;

    /// Server-indicated wait. `None` falls back to the policy default.
    fn retry_after(&self) -> Option<Duration>;
}

/// How an individual failed attempt is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    RateLimited { retry_after: Option<Duration> },
    Other,
}

impl Classification {
    #[must_use]
    pub fn of<E: RateLimitSignal>(err: &E) -> Self {
        if err.is_rate_limited() {
            Classification::RateLimited {
                retry_after: err.retry_after(),
            }
        } else {
            Classification::Other
        }
    }
}

/// Attempt cap and wait bounds for [`retry_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub default_retry_after: Duration,
    /// Upper bound on a single wait, regardless of what the server asks for.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_retry_after: Duration::from_secs(2),
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            default_retry_after: Duration::from_secs(config.default_retry_after_secs),
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
        }
    }

    /// A policy that never waits; used by tests and callers that pace themselves.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            default_retry_after: Duration::ZERO,
            max_retry_after: Duration::ZERO,
        }
    }

    fn delay_for(&self, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or(self.default_retry_after)
            .min(self.max_retry_after)
    }
}

/// Parses a `Retry-After` header value given in (possibly fractional) seconds.
///
/// Shopify sends values like `"2.0"`. Missing, non-numeric, negative or
/// non-finite values yield `None` so the caller can apply its default.
#[must_use]
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    let secs = value?.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// Runs `operation`, retrying rate-limit failures according to `policy`.
///
/// # Errors
///
/// Returns the first non-rate-limit error unchanged, or the last rate-limit
/// error once `policy.max_attempts` attempts have been made.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    E: RateLimitSignal + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with(policy, |err: &E| Classification::of(err), operation).await
}

/// [`retry_with_backoff`] with an explicit failure classifier.
///
/// # Errors
///
/// See [`retry_with_backoff`].
pub async fn retry_with<T, E, C, F, Fut>(
    policy: &RetryPolicy,
    classify: C,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    C: Fn(&E) -> Classification,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let Classification::RateLimited { retry_after } = classify(&err) else {
            return Err(err);
        };

        if attempt >= max_attempts {
            tracing::warn!(
                attempt,
                max_attempts,
                error = %err,
                "rate limit persisted through every attempt"
            );
            return Err(err);
        }

        let delay = policy.delay_for(retry_after);
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "rate limited by Shopify, waiting before retry"
        );
        pause(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    enum FakeError {
        Throttled(Option<Duration>),
        Broken,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                FakeError::Throttled(_) => write!(f, "throttled"),
                FakeError::Broken => write!(f, "broken"),
            }
        }
    }

    impl RateLimitSignal for FakeError {
        fn is_rate_limited(&self) -> bool {
            matches!(self, FakeError::Throttled(_))
        }

        fn retry_after(&self) -> Option<Duration> {
            match self {
                FakeError::Throttled(d) => *d,
                FakeError::Broken => None,
            }
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, FakeError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(FakeError::Throttled(Some(Duration::ZERO)))
                } else {
                    Ok::<u32, FakeError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn surfaces_rate_limit_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(FakeError::Throttled(None))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "max_attempts counts the first try");
        assert!(matches!(result, Err(FakeError::Throttled(_))));
    }

    #[tokio::test]
    async fn does_not_retry_other_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(FakeError::Broken)
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(FakeError::Broken)));
    }

    #[tokio::test]
    async fn zero_max_attempts_still_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let _ = retry_with_backoff(&RetryPolicy::immediate(0), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(FakeError::Throttled(None))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_classifier_can_retry_any_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with(
            &RetryPolicy::immediate(2),
            |_: &FakeError| Classification::RateLimited { retry_after: None },
            || {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(FakeError::Broken)
                    } else {
                        Ok(1)
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn waits_for_the_default_when_no_retry_after() {
        let policy = RetryPolicy {
            max_attempts: 2,
            default_retry_after: Duration::from_millis(30),
            max_retry_after: Duration::from_secs(1),
        };
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let started = std::time::Instant::now();
        let _ = retry_with_backoff(&policy, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(FakeError::Throttled(None))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn delay_is_capped_by_max_retry_after() {
        let policy = RetryPolicy {
            max_attempts: 3,
            default_retry_after: Duration::from_secs(2),
            max_retry_after: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(Some(Duration::from_secs(120))), Duration::from_secs(5));
        assert_eq!(policy.delay_for(None), Duration::from_secs(2));
    }

    #[test]
    fn parse_retry_after_accepts_fractional_seconds() {
        assert_eq!(parse_retry_after(Some("2.0")), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(Some(" 1 ")), Some(Duration::from_secs(1)));
        assert_eq!(parse_retry_after(Some("0.5")), Some(Duration::from_millis(500)));
    }

    #[test]
    fn parse_retry_after_rejects_garbage() {
        assert_eq!(parse_retry_after(None), None);
        assert_eq!(parse_retry_after(Some("")), None);
        assert_eq!(parse_retry_after(Some("soon")), None);
        assert_eq!(parse_retry_after(Some("-3")), None);
        assert_eq!(parse_retry_after(Some("NaN")), None);
        assert_eq!(parse_retry_after(Some("inf")), None);
    }
}
