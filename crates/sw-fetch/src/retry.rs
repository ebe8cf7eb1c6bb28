//! Retry policies for replayed submissions.
//!
//! Strategies never retry: a failed fetch is answered from cache or
//! propagated. Retries are only used when replaying deferred work after
//! connectivity returns.

use std::time::Duration;

use sw_core::{FetchRequest, ResponseSnapshot};

use crate::client::{FetchError, Fetcher};

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff with base and max.
    Exponential {
        /// Initial delay.
        base: Duration,
        /// Maximum delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let multiplier = 2u64.saturating_pow(attempt);
                let delay = Duration::from_millis((base.as_millis() as u64).saturating_mul(multiplier));
                std::cmp::min(delay, *max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
            max: Duration::from_secs(5),
        }
    }
}

/// Conditions that trigger a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCondition {
    /// Retry on specific HTTP status code.
    StatusCode(u16),
    /// Retry on any 5xx status.
    ServerError,
    /// Retry on timeout.
    Timeout,
    /// Retry on connection error or no network.
    ConnectionError,
}

impl RetryCondition {
    /// Check if a status code matches this condition.
    pub fn matches_status(&self, status: u16) -> bool {
        match self {
            Self::StatusCode(code) => status == *code,
            Self::ServerError => (500..600).contains(&status),
            _ => false,
        }
    }

    /// Check if a fetch error matches this condition.
    pub fn matches_error(&self, error: &FetchError) -> bool {
        match self {
            Self::Timeout => matches!(error, FetchError::Timeout(_)),
            Self::ConnectionError => {
                matches!(error, FetchError::Connection(_) | FetchError::Offline)
            }
            _ => false,
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try.
    pub max_attempts: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Conditions that trigger retry.
    pub retry_on: Vec<RetryCondition>,
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::default(),
            retry_on: vec![
                RetryCondition::ServerError,
                RetryCondition::Timeout,
                RetryCondition::ConnectionError,
            ],
        }
    }

    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            backoff: BackoffStrategy::None,
            retry_on: Vec::new(),
        }
    }

    /// Set backoff strategy.
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Set retry conditions.
    pub fn with_conditions(mut self, conditions: Vec<RetryCondition>) -> Self {
        self.retry_on = conditions;
        self
    }

    /// Check if should retry based on status code.
    pub fn should_retry_status(&self, status: u16, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        self.retry_on.iter().any(|c| c.matches_status(status))
    }

    /// Check if should retry after a fetch error.
    pub fn should_retry_error(&self, error: &FetchError, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        self.retry_on.iter().any(|c| c.matches_error(error))
    }

    /// Fetch through `fetcher`, retrying per this policy.
    ///
    /// Returns the last response or error once retries are exhausted.
    pub async fn fetch<F: Fetcher + ?Sized>(
        &self,
        fetcher: &F,
        request: &FetchRequest,
    ) -> Result<ResponseSnapshot, FetchError> {
        let mut attempt = 0;
        loop {
            match fetcher.fetch(request).await {
                Ok(response) if self.should_retry_status(response.status.as_u16(), attempt) => {
                    tracing::debug!(url = %request.url, status = %response.status, attempt, "retrying after status");
                }
                Ok(response) => return Ok(response),
                Err(e) if self.should_retry_error(&e, attempt) => {
                    tracing::debug!(url = %request.url, error = %e, attempt, "retrying after error");
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sw_core::StatusCode;

    struct Scripted {
        results: Mutex<Vec<Result<ResponseSnapshot, FetchError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<ResponseSnapshot, FetchError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for Scripted {
        async fn fetch(&self, _request: &FetchRequest) -> Result<ResponseSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results.lock().unwrap().pop().unwrap_or(Err(FetchError::Offline))
        }
    }

    fn request() -> FetchRequest {
        FetchRequest::parse_get("https://hotel.example/api/booking").unwrap()
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let backoff = BackoffStrategy::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_millis(350));
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::new(1);
        assert!(policy.should_retry_error(&FetchError::Offline, 0));
        assert!(!policy.should_retry_error(&FetchError::Offline, 1));
        assert!(!policy.should_retry_error(&FetchError::Request("bad".into()), 0));
        assert!(policy.should_retry_status(503, 0));
        assert!(!policy.should_retry_status(404, 0));
    }

    #[tokio::test]
    async fn test_fetch_retries_until_success() {
        let fetcher = Scripted::new(vec![
            Err(FetchError::Offline),
            Ok(ResponseSnapshot::new(StatusCode::SERVICE_UNAVAILABLE, "")),
            Ok(ResponseSnapshot::ok("booked")),
        ]);
        let policy = RetryPolicy::new(3).with_backoff(BackoffStrategy::None);

        let response = policy.fetch(&fetcher, &request()).await.unwrap();
        assert_eq!(response.text(), "booked");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_gives_up() {
        let fetcher = Scripted::new(vec![]);
        let policy = RetryPolicy::new(2).with_backoff(BackoffStrategy::None);

        let err = policy.fetch(&fetcher, &request()).await.unwrap_err();
        assert_eq!(err, FetchError::Offline);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }
}
