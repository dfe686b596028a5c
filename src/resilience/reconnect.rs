//! Reconnection policy for live channels.
//!
//! # State Transitions
//! ```text
//! connection ended, attempt < max  → schedule(base * 2^attempt), attempt += 1
//! connection ended, attempt >= max → exhausted (channel abandoned)
//! connection opened                → attempt = 0
//! ```
//!
//! One ended connection maps to exactly one call to [`ReconnectPolicy::next_delay`],
//! so a transport error followed by a close for the same failure counts once.

use std::time::Duration;

use crate::config::ReconnectConfig;
use crate::resilience::backoff::calculate_backoff;

/// Attempt counter with an exponential delay schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    attempt: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Reconnection attempts initiated since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Initiate the next reconnection attempt.
    ///
    /// Returns the delay to wait before connecting, or `None` once the
    /// ceiling is reached. The counter moves only when a delay is returned.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let delay = calculate_backoff(self.attempt, base_ms);
        self.attempt += 1;
        Some(delay)
    }

    /// A connection opened successfully.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}
