//! Bounded retry for store-level write conflicts.
//!
//! The check-and-insert and read-modify-write units in [`crate::services::scheduling`]
//! run inside an immediate SQLite transaction. When another connection holds the
//! write lock past the busy timeout, or a compare-and-set loses, the whole unit is
//! re-run from scratch. Domain errors are never retried.

use std::thread::sleep;
use std::time::Duration;

use crate::errors::BookingError;

/// Exponential backoff settings.
///
/// Defaults: 5 attempts, 20ms initial delay doubling up to 500ms.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let factor = self
            .multiplier
            .checked_pow(u32::try_from(attempt).unwrap_or(u32::MAX))
            .unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the policy
/// runs out of attempts. Exhaustion is reported as [`BookingError::StoreBusy`].
pub fn retry_on_conflict<T, F>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, BookingError>
where
    F: FnMut() -> Result<T, BookingError>,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 0..attempts {
        match op() {
            Err(e) if e.is_transient() => {
                if attempt + 1 == attempts {
                    break;
                }
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "store conflict, retrying"
                );
                sleep(delay);
            }
            other => return other,
        }
    }

    tracing::warn!(operation, attempts, "store conflict retries exhausted");
    Err(BookingError::StoreBusy { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2,
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(20));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(40));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(80));
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(100), Duration::from_millis(500));
    }

    #[test]
    fn test_success_after_transient_failures() {
        let mut calls = 0;
        let result = retry_on_conflict(&fast_policy(5), "test", || {
            calls += 1;
            if calls < 3 {
                Err(BookingError::StaleWrite)
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_exhaustion_is_store_busy() {
        let mut calls = 0;
        let result: Result<(), _> = retry_on_conflict(&fast_policy(3), "test", || {
            calls += 1;
            Err(BookingError::StaleWrite)
        });
        assert_eq!(calls, 3);
        assert!(matches!(result, Err(BookingError::StoreBusy { attempts: 3 })));
    }

    #[test]
    fn test_domain_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = retry_on_conflict(&fast_policy(5), "test", || {
            calls += 1;
            Err(BookingError::SlotUnavailable)
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(BookingError::SlotUnavailable)));
    }
}
