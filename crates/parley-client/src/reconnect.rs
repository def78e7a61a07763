//! Reconnect backoff.

use std::time::Duration;

/// Bounded exponential backoff for re-establishing a lost connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts before giving up. Zero disables reconnecting.
    pub max_attempts: u32,
    /// Delay before the first attempt.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Default number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

    /// Default first delay.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

    /// Default delay cap.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Never reconnect.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_attempts: 0,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }

    /// Delay before 1-based `attempt`, or `None` once attempts are exhausted.
    ///
    /// Doubles per attempt starting at `base_delay`, capped at `max_delay`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn doubles_then_caps() {
        let policy = ReconnectPolicy {
            max_attempts: 8,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        };

        let delays: Vec<u64> = (1..=6).filter_map(|n| policy.delay(n)).map(|d| d.as_secs()).collect();
        assert_eq!(delays, [1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn exhausted_after_max_attempts() {
        let policy = ReconnectPolicy { max_attempts: 2, ..ReconnectPolicy::default() };
        assert!(policy.delay(2).is_some());
        assert!(policy.delay(3).is_none());
        assert!(policy.delay(0).is_none());
        assert!(ReconnectPolicy::disabled().delay(1).is_none());
    }

    proptest! {
        #[test]
        fn prop_delay_never_exceeds_cap(attempt in 1u32..200, base_ms in 1u64..10_000, cap_ms in 1u64..120_000) {
            let policy = ReconnectPolicy {
                max_attempts: u32::MAX,
                base_delay: Duration::from_millis(base_ms),
                max_delay: Duration::from_millis(cap_ms),
            };
            let delay = policy.delay(attempt).expect("within attempts");
            prop_assert!(delay <= policy.max_delay);
        }
    }
}
