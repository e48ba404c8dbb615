//! Retry policies and predicates for handling transient failures.
//!
//! A [`RetryPolicy`] combines a maximum attempt count, a
//! [`BackoffStrategy`], and a predicate over the failure. The execution
//! engine asks the policy after each failed attempt; attempt numbering is
//! 1-based and counts retries, not the initial try.

use crate::{BackoffStrategy, Error};
use std::sync::Arc;
use std::time::Duration;

/// Trait for determining whether a failed request should be retried.
///
/// Implement this trait to create custom retry logic based on the error
/// kind, status code, or any other criteria.
///
/// # Examples
///
/// ```
/// use graphite_client::{Error, RetryPredicate};
///
/// struct RetryOnRateLimit;
///
/// impl RetryPredicate for RetryOnRateLimit {
///     fn should_retry(&self, error: &Error, _attempt: u32) -> bool {
///         matches!(error, Error::RateLimited { .. })
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Determines whether the request should be retried.
    ///
    /// `attempt` is the 1-indexed retry attempt about to be made.
    fn should_retry(&self, error: &Error, attempt: u32) -> bool;
}

/// Retry on connection and timeout failures.
///
/// This is the default predicate: both kinds are transient network
/// conditions that a later attempt may not hit.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTransient;

impl RetryPredicate for RetryOnTransient {
    fn should_retry(&self, error: &Error, _attempt: u32) -> bool {
        matches!(
            error,
            Error::Connection { .. } | Error::Timeout { .. } | Error::Network(_)
        )
    }
}

/// Retry only on 5xx server errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnServerError;

impl RetryPredicate for RetryOnServerError {
    fn should_retry(&self, error: &Error, _attempt: u32) -> bool {
        matches!(error, Error::Http { status, .. } if status.is_server_error())
    }
}

/// Retry on any failure classified as retryable.
///
/// Uses [`Error::is_retryable`], which covers connection failures,
/// timeouts, 5xx statuses, and server rate limits carrying a reset hint.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: u32) -> bool {
        error.is_retryable()
    }
}

/// Never retry.
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn should_retry(&self, _error: &Error, _attempt: u32) -> bool {
        false
    }
}

/// Combine multiple retry predicates with OR logic.
///
/// Retries if ANY of the predicates return `true`.
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates a new `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        self.predicates.iter().any(|p| p.should_retry(error, attempt))
    }
}

/// Combine multiple retry predicates with AND logic.
///
/// Retries only if ALL of the predicates return `true`.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Creates a new `AndPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        self.predicates.iter().all(|p| p.should_retry(error, attempt))
    }
}

/// Observer for retry activity on a client.
///
/// All callbacks run on the task executing the operation, never from a
/// background scheduler.
pub trait RetryListener: Send + Sync {
    /// A retry is about to be scheduled. `attempt` is the 1-indexed retry
    /// attempt, `delay` the wait before it runs.
    fn on_retry(&self, attempt: u32, delay: Duration, error: &Error) {
        let _ = (attempt, delay, error);
    }

    /// The operation succeeded after at least one retry. `attempts_taken`
    /// counts every try, including the initial one.
    fn on_success(&self, attempts_taken: u32) {
        let _ = attempts_taken;
    }

    /// Retries were attempted and exhausted. `retries` counts the retry
    /// attempts that ran; the original last failure propagates unchanged.
    fn on_exhausted(&self, retries: u32, error: &Error) {
        let _ = (retries, error);
    }
}

/// Decides when to retry a failed operation and how long to wait.
///
/// # Examples
///
/// ```
/// use graphite_client::{BackoffStrategy, RetryPolicy};
/// use std::time::Duration;
///
/// let backoff = BackoffStrategy::exponential(
///     Duration::from_millis(100),
///     Duration::from_secs(30),
///     2.0,
/// ).unwrap();
///
/// // Retry up to 3 times on connection failures and timeouts.
/// let policy = RetryPolicy::transient(3, backoff);
/// assert_eq!(policy.max_attempts(), 3);
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffStrategy,
    predicate: Arc<dyn RetryPredicate>,
}

impl RetryPolicy {
    /// Creates a policy from its parts. `max_attempts` of 0 disables retry.
    pub fn new(
        max_attempts: u32,
        backoff: BackoffStrategy,
        predicate: Arc<dyn RetryPredicate>,
    ) -> Self {
        Self {
            max_attempts,
            backoff,
            predicate,
        }
    }

    /// Retry connection and timeout failures. The default shape.
    pub fn transient(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self::new(max_attempts, backoff, Arc::new(RetryOnTransient))
    }

    /// Retry 5xx server errors only.
    pub fn on_server_errors(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self::new(max_attempts, backoff, Arc::new(RetryOnServerError))
    }

    /// Retry any failure classified as retryable.
    pub fn on_any_retryable(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self::new(max_attempts, backoff, Arc::new(RetryOnRetryable))
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self::new(0, BackoffStrategy::fixed(Duration::ZERO), Arc::new(NeverRetry))
    }

    /// Returns the maximum number of retry attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Asks whether retry attempt `attempt` (1-indexed) should run after
    /// `error`.
    ///
    /// Always `false` once `attempt > max_attempts`, regardless of the
    /// predicate.
    pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        if attempt > self.max_attempts {
            return false;
        }
        self.predicate.should_retry(error, attempt)
    }

    /// Returns the delay before retry attempt `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeoutPhase;
    use http::{HeaderMap, StatusCode};

    fn timeout_error() -> Error {
        Error::Timeout {
            phase: TimeoutPhase::Connect,
        }
    }

    fn server_error() -> Error {
        Error::Http {
            status: StatusCode::BAD_GATEWAY,
            raw_response: String::new(),
            headers: HeaderMap::new(),
            rate_limit_info: None,
        }
    }

    #[test]
    fn test_attempt_ceiling_wins_over_predicate() {
        let policy = RetryPolicy::transient(3, BackoffStrategy::fixed(Duration::ZERO));
        let err = timeout_error();
        assert!(policy.should_retry(&err, 1));
        assert!(policy.should_retry(&err, 3));
        assert!(!policy.should_retry(&err, 4));
    }

    #[test]
    fn test_disabled_policy_never_retries() {
        let policy = RetryPolicy::disabled();
        assert_eq!(policy.max_attempts(), 0);
        assert!(!policy.should_retry(&timeout_error(), 1));
        assert!(!policy.should_retry(&server_error(), 1));
    }

    #[test]
    fn test_transient_predicate_ignores_server_errors() {
        let policy = RetryPolicy::transient(3, BackoffStrategy::fixed(Duration::ZERO));
        assert!(policy.should_retry(&timeout_error(), 1));
        assert!(!policy.should_retry(&server_error(), 1));
    }

    #[test]
    fn test_server_error_predicate() {
        let policy = RetryPolicy::on_server_errors(3, BackoffStrategy::fixed(Duration::ZERO));
        assert!(policy.should_retry(&server_error(), 1));
        assert!(!policy.should_retry(&timeout_error(), 1));
    }

    #[test]
    fn test_delay_delegates_to_backoff() {
        let backoff = BackoffStrategy::exponential(
            Duration::from_millis(100),
            Duration::from_secs(30),
            2.0,
        )
        .unwrap();
        let policy = RetryPolicy::transient(5, backoff);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(800));
    }

    #[test]
    fn test_predicate_combinators() {
        let either = OrPredicate::new(vec![
            Box::new(RetryOnServerError),
            Box::new(RetryOnTransient),
        ]);
        assert!(either.should_retry(&server_error(), 1));
        assert!(either.should_retry(&timeout_error(), 1));

        let both = AndPredicate::new(vec![
            Box::new(RetryOnServerError),
            Box::new(RetryOnRetryable),
        ]);
        assert!(both.should_retry(&server_error(), 1));
        assert!(!both.should_retry(&timeout_error(), 1));
    }
}
