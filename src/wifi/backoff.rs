//! Exponential backoff between connection attempts.
//!
//! The first attempt starts immediately. Before attempt `k` (k >= 2) the
//! manager waits `base * 2^(k-2)`, capped at the configured maximum:
//!
//! | attempt | delay (base 500 ms, cap 30 s) |
//! |---------|-------------------------------|
//! | 1       | 0                             |
//! | 2       | 500 ms                        |
//! | 3       | 1 s                           |
//! | 4       | 2 s                           |
//! | ...     | ...                           |
//! | 8+      | 30 s                          |

use std::time::Duration;

/// Largest shift applied to the base; beyond this the cap always wins.
const MAX_EXPONENT: u32 = 31;

/// Delay to wait before 1-based attempt number `attempt`.
///
/// Never overflows: the multiplication saturates and the result is capped at
/// `max_ms`.
pub fn backoff_delay(base_ms: u32, max_ms: u32, attempt: u32) -> Duration {
    if attempt < 2 {
        return Duration::ZERO;
    }

    let exponent = (attempt - 2).min(MAX_EXPONENT);
    let delay_ms = u64::from(base_ms)
        .saturating_mul(1u64 << exponent)
        .min(u64::from(max_ms));

    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_has_no_delay() {
        assert_eq!(backoff_delay(500, 30_000, 0), Duration::ZERO);
        assert_eq!(backoff_delay(500, 30_000, 1), Duration::ZERO);
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        for k in 2..=8 {
            let expected = 500u64 * (1 << (k - 2));
            assert_eq!(
                backoff_delay(500, 1_000_000, k),
                Duration::from_millis(expected),
                "attempt {}",
                k
            );
        }
    }

    #[test]
    fn test_delay_capped_at_max() {
        assert_eq!(backoff_delay(500, 30_000, 7), Duration::from_millis(16_000));
        assert_eq!(backoff_delay(500, 30_000, 8), Duration::from_millis(30_000));
        assert_eq!(backoff_delay(500, 30_000, 9), Duration::from_millis(30_000));
    }

    #[test]
    fn test_huge_attempt_numbers_saturate() {
        assert_eq!(
            backoff_delay(u32::MAX, u32::MAX, u32::MAX),
            Duration::from_millis(u64::from(u32::MAX))
        );
        assert_eq!(
            backoff_delay(1, 30_000, 1_000),
            Duration::from_millis(30_000)
        );
    }

    #[test]
    fn test_cap_equal_to_base() {
        for k in 2..10 {
            assert_eq!(backoff_delay(250, 250, k), Duration::from_millis(250));
        }
    }
}
