//! Rate-limit retry policy for the file-event search endpoint.
//!
//! `POST /v2/file-events` is throttled per tenant and answers `429 Too Many
//! Requests` when the limit is hit. Only that status is retried. The server's
//! `Retry-After` header (integer seconds) is honored when present, up to
//! [`MAX_RETRY_AFTER`]; otherwise the delay grows exponentially from
//! `base_delay`.

use reqwest::header::HeaderValue;
use std::time::Duration;

/// Upper bound on the exponent so `base_delay * 2^attempt` cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Longest `Retry-After` wait honored for a single retry.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Retry settings applied to rate-limited requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// How many times a `429` response is retried before it is returned to
    /// the caller as an `IncydrError::Api`.
    pub max_retries: u32,
    /// Delay before the first retry when the server sends no `Retry-After`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        RetryPolicy {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay to wait before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32, retry_after: Option<&HeaderValue>) -> Duration {
        if let Some(delay) = parse_retry_after(retry_after) {
            return delay.min(MAX_RETRY_AFTER);
        }
        self.base_delay * 2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT))
    }
}

/// Parses a `Retry-After` header holding delay-seconds. HTTP-date values are
/// not produced by the Incydr API and are ignored.
fn parse_retry_after(value: Option<&HeaderValue>) -> Option<Duration> {
    let secs = value?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_retries_five_times_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0, None), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3, None), Duration::from_millis(800));
    }

    #[test]
    fn retry_after_header_overrides_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let header = HeaderValue::from_static("7");
        assert_eq!(policy.delay_for(4, Some(&header)), Duration::from_secs(7));
    }

    #[test]
    fn long_retry_after_is_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let header = HeaderValue::from_static("86400");
        assert_eq!(policy.delay_for(0, Some(&header)), MAX_RETRY_AFTER);
    }

    #[test]
    fn unparseable_retry_after_falls_back_to_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let header = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(policy.delay_for(1, Some(&header)), Duration::from_millis(200));
    }

    #[test]
    fn backoff_exponent_is_capped() {
        let policy = RetryPolicy::new(50, Duration::from_millis(1));
        assert_eq!(policy.delay_for(40, None), Duration::from_millis(1024));
    }
}
