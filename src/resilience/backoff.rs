//! Exponential backoff.

use std::time::Duration;

/// Delay before reconnection attempt `attempt` (zero-based): `base_ms * 2^attempt`.
///
/// Uncapped and without jitter; the attempt ceiling bounds it.
/// Saturates instead of overflowing.
pub fn calculate_backoff(attempt: u32, base_ms: u64) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt);
    Duration::from_millis(base_ms.saturating_mul(exponential_base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let delays: Vec<u128> = (0..5).map(|n| calculate_backoff(n, 1000).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
    }

    #[test]
    fn test_backoff_strictly_increasing() {
        for n in 0..20 {
            assert!(calculate_backoff(n + 1, 250) > calculate_backoff(n, 250));
        }
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(calculate_backoff(200, 1000), Duration::from_millis(u64::MAX));
    }
}
