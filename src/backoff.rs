//! Backoff strategies for spacing retry attempts.
//!
//! A strategy is a pure function from the retry attempt number (1-indexed)
//! to a delay duration. Jitter is a decorator over any strategy.

use crate::{Error, Result};
use rand::Rng;
use std::time::Duration;

/// Defines how long to wait before each retry attempt.
///
/// # Examples
///
/// ```
/// use graphite_client::BackoffStrategy;
/// use std::time::Duration;
///
/// // Exponential backoff: 100ms, 200ms, 400ms, 800ms... capped at 30s
/// let exponential = BackoffStrategy::exponential(
///     Duration::from_millis(100),
///     Duration::from_secs(30),
///     2.0,
/// ).unwrap();
/// assert_eq!(exponential.delay_for_attempt(3), Duration::from_millis(400));
///
/// // Fixed backoff: 1s for every attempt
/// let fixed = BackoffStrategy::fixed(Duration::from_secs(1));
/// assert_eq!(fixed.delay_for_attempt(1000), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// The same delay before every attempt.
    Fixed {
        /// The delay between retry attempts.
        delay: Duration,
    },

    /// Exponentially increasing delays, capped at a maximum.
    ///
    /// Attempt `n` waits `initial_delay * multiplier^(n - 1)`, never more
    /// than `max_delay`.
    Exponential {
        /// The delay before the first retry attempt.
        initial_delay: Duration,
        /// The cap applied to the computed delay.
        max_delay: Duration,
        /// The growth factor, strictly greater than 1.0.
        multiplier: f64,
    },

    /// Wraps another strategy, scaling each delay by a uniform random
    /// factor in `[1 - jitter_factor, 1]`.
    Jittered {
        /// The decorated strategy.
        inner: Box<BackoffStrategy>,
        /// How much of the delay may be shaved off, in `[0, 1]`.
        jitter_factor: f64,
    },
}

impl BackoffStrategy {
    /// A fixed delay for every attempt.
    pub fn fixed(delay: Duration) -> Self {
        BackoffStrategy::Fixed { delay }
    }

    /// Exponential backoff from `initial_delay` up to `max_delay`.
    ///
    /// # Errors
    ///
    /// Fails if `multiplier <= 1.0` or `initial_delay > max_delay`.
    pub fn exponential(
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Result<Self> {
        if multiplier <= 1.0 || !multiplier.is_finite() {
            return Err(Error::ConfigurationError(format!(
                "backoff multiplier must be greater than 1.0, got {multiplier}"
            )));
        }
        if initial_delay > max_delay {
            return Err(Error::ConfigurationError(format!(
                "initial delay {initial_delay:?} exceeds max delay {max_delay:?}"
            )));
        }
        Ok(BackoffStrategy::Exponential {
            initial_delay,
            max_delay,
            multiplier,
        })
    }

    /// Decorates this strategy with random jitter.
    ///
    /// Each delay is scaled by a uniform factor in `[1 - jitter_factor, 1]`.
    /// A `jitter_factor` of `0.0` is a no-op and returns the strategy
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Fails if `jitter_factor` is outside `[0, 1]`.
    pub fn with_jitter(self, jitter_factor: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&jitter_factor) {
            return Err(Error::ConfigurationError(format!(
                "jitter factor must be within [0, 1], got {jitter_factor}"
            )));
        }
        if jitter_factor == 0.0 {
            return Ok(self);
        }
        Ok(BackoffStrategy::Jittered {
            inner: Box::new(self),
            jitter_factor,
        })
    }

    /// Returns the delay before the given retry attempt.
    ///
    /// # Panics
    ///
    /// Panics if `attempt` is 0; attempts are 1-indexed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        assert!(attempt >= 1, "retry attempts are 1-indexed");
        match self {
            BackoffStrategy::Fixed { delay } => *delay,
            BackoffStrategy::Exponential {
                initial_delay,
                max_delay,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32 - 1);
                let secs = initial_delay.as_secs_f64() * factor;
                if !secs.is_finite() || secs >= max_delay.as_secs_f64() {
                    *max_delay
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
            BackoffStrategy::Jittered {
                inner,
                jitter_factor,
            } => {
                let delay = inner.delay_for_attempt(attempt);
                let shave: f64 = rand::thread_rng().gen_range(0.0..=1.0);
                delay.mul_f64(1.0 - shave * jitter_factor)
            }
        }
    }

    /// Returns `true` once the computed delay has reached the cap.
    ///
    /// Fixed strategies are always at their maximum; jitter defers to the
    /// decorated strategy.
    pub fn is_at_max_delay(&self, attempt: u32) -> bool {
        match self {
            BackoffStrategy::Fixed { .. } => true,
            BackoffStrategy::Exponential { max_delay, .. } => {
                self.delay_for_attempt(attempt) >= *max_delay
            }
            BackoffStrategy::Jittered { inner, .. } => inner.is_at_max_delay(attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_delays() {
        let strategy = BackoffStrategy::exponential(
            Duration::from_millis(100),
            Duration::from_secs(30),
            2.0,
        )
        .unwrap();

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(strategy.delay_for_attempt(4), Duration::from_millis(800));
        assert_eq!(strategy.delay_for_attempt(5), Duration::from_millis(1600));
    }

    #[test]
    fn test_exponential_is_non_decreasing_and_capped() {
        let max = Duration::from_secs(10);
        let strategy =
            BackoffStrategy::exponential(Duration::from_millis(100), max, 2.0).unwrap();

        let mut previous = Duration::ZERO;
        for attempt in 1..=40 {
            let delay = strategy.delay_for_attempt(attempt);
            assert!(delay >= previous);
            assert!(delay <= max);
            previous = delay;
        }
        assert_eq!(strategy.delay_for_attempt(40), max);
        assert!(strategy.is_at_max_delay(40));
        assert!(!strategy.is_at_max_delay(1));
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let strategy = BackoffStrategy::fixed(Duration::from_secs(1));
        assert_eq!(strategy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for_attempt(1000), Duration::from_secs(1));
        assert!(strategy.is_at_max_delay(1));
    }

    #[test]
    fn test_zero_jitter_is_a_no_op() {
        let strategy = BackoffStrategy::exponential(
            Duration::from_millis(100),
            Duration::from_secs(30),
            2.0,
        )
        .unwrap()
        .with_jitter(0.0)
        .unwrap();

        // The unwrapped strategy is returned unchanged.
        assert!(matches!(strategy, BackoffStrategy::Exponential { .. }));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let base = Duration::from_millis(1000);
        let strategy = BackoffStrategy::fixed(base).with_jitter(0.5).unwrap();
        for _ in 0..100 {
            let delay = strategy.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= base);
        }
        assert!(strategy.is_at_max_delay(7));
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(BackoffStrategy::exponential(
            Duration::from_secs(10),
            Duration::from_secs(1),
            2.0
        )
        .is_err());
        assert!(BackoffStrategy::exponential(
            Duration::from_millis(100),
            Duration::from_secs(1),
            1.0
        )
        .is_err());
        assert!(BackoffStrategy::fixed(Duration::ZERO).with_jitter(1.5).is_err());
    }

    #[test]
    #[should_panic(expected = "1-indexed")]
    fn test_attempt_zero_is_a_precondition_violation() {
        BackoffStrategy::fixed(Duration::ZERO).delay_for_attempt(0);
    }
}
