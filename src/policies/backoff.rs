//! # Reconnect backoff policy.
//!
//! [`BackoffPolicy`] maps the number of consecutive failures since the last
//! successful registration to the wait inserted before the next dial.
//! It is parameterized by:
//! - [`BackoffPolicy::first`] the delay after the first failure;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap.
//!
//! The delay for attempt `n` (1-based) is `first × factor^(n-1)`, clamped to `max`,
//! then jitter is applied. The base is derived from the attempt number alone, so
//! jitter output never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use agentlink::BackoffPolicy;
//!
//! let backoff = BackoffPolicy::default();
//!
//! assert_eq!(backoff.delay(1), Duration::from_secs(5));
//! assert_eq!(backoff.delay(2), Duration::from_secs(10));
//! // 5s × 2^6 = 320s → capped at max=300s
//! assert_eq!(backoff.delay(7), Duration::from_secs(300));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policies::jitter::JitterPolicy;

/// Reconnect backoff policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied on top of the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns the collector reconnect schedule:
    /// - `first = 5s`;
    /// - `factor = 2.0` (doubling);
    /// - `max = 5min`;
    /// - `jitter = None` (deterministic).
    fn default() -> Self {
        Self {
            first: Duration::from_secs(5),
            max: Duration::from_secs(300),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given failure count (1-based).
    ///
    /// `delay(1) == first`; each further attempt multiplies by `factor`; the
    /// result never exceeds [`BackoffPolicy::max`]. `attempt = 0` is treated as 1,
    /// the supervisor never asks for it.
    ///
    /// # Notes
    /// - With `JitterPolicy::None` the function is pure and deterministic.
    /// - Non-finite or negative intermediate values clamp to `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_secs = self.max.as_secs_f64();
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_default_schedule() {
        let policy = BackoffPolicy::default();
        let expected = [5, 10, 20, 40, 80, 160, 300, 300, 300];
        for (i, want) in expected.iter().enumerate() {
            let attempt = i as u32 + 1;
            assert_eq!(
                policy.delay(attempt),
                secs(*want),
                "attempt {attempt} should wait {want}s"
            );
        }
    }

    #[test]
    fn test_attempt_zero_behaves_like_first() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(0), policy.delay(1));
    }

    #[test]
    fn test_non_decreasing() {
        let policy = BackoffPolicy::default();
        let mut prev = Duration::ZERO;
        for attempt in 1..64 {
            let d = policy.delay(attempt);
            assert!(d >= prev, "attempt {attempt}: {d:?} < {prev:?}");
            prev = d;
        }
    }

    #[test]
    fn test_matches_closed_form_below_cap() {
        let policy = BackoffPolicy::default();
        for attempt in 1..=6u32 {
            let closed = 5u64 * 2u64.pow(attempt - 1);
            assert!(closed < 300);
            assert_eq!(policy.delay(attempt), secs(closed));
        }
    }

    #[test]
    fn test_constant_factor() {
        let policy = BackoffPolicy {
            first: Duration::from_millis(500),
            factor: 1.0,
            ..BackoffPolicy::default()
        };
        for attempt in 1..10 {
            assert_eq!(policy.delay(attempt), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = BackoffPolicy {
            first: secs(10),
            max: secs(5),
            ..BackoffPolicy::default()
        };
        assert_eq!(policy.delay(1), secs(5));
    }

    #[test]
    fn test_huge_attempt_clamps_to_max() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay(100), secs(300));
        assert_eq!(policy.delay(u32::MAX), secs(300));
    }

    #[test]
    fn test_full_jitter_stays_under_base() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Full,
            ..BackoffPolicy::default()
        };
        for attempt in 1..12u32 {
            let base = BackoffPolicy::default().delay(attempt);
            assert!(policy.delay(attempt) <= base);
        }
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..BackoffPolicy::default()
        };
        for attempt in 1..12u32 {
            let base = BackoffPolicy::default().delay(attempt);
            let d = policy.delay(attempt);
            assert!(d >= base / 2, "attempt {attempt}: {d:?} below half of {base:?}");
            assert!(d <= base);
        }
    }

    #[test]
    fn test_decorrelated_jitter_respects_floor_and_cap() {
        let policy = BackoffPolicy {
            jitter: JitterPolicy::Decorrelated,
            ..BackoffPolicy::default()
        };
        for _ in 0..100 {
            let d = policy.delay(9);
            assert!(d >= secs(5));
            assert!(d <= secs(300));
        }
    }
}
