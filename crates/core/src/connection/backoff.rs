//! # Reconnect Backoff
//!
//! Bounded exponential backoff with jitter for re-opening the socket.

use crate::models::rand_u32;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When and how often to re-open a dropped socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay
    pub max_delay_ms: u64,
    /// Growth factor between consecutive retries
    pub multiplier: f64,
    /// Consecutive failed attempts before giving up (0 = never reconnect)
    pub max_attempts: u32,
    /// Fraction of the delay randomized in both directions (0.0..=1.0)
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            multiplier: 2.0,
            max_attempts: 5,
            jitter: 0.2,
        }
    }
}

impl ReconnectPolicy {
    /// One connection attempt, no retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based) without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let millis = self.initial_delay_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        Duration::from_millis(millis.min(self.max_delay_ms as f64) as u64)
    }

    /// Delay before retry number `attempt`, or `None` once attempts are exhausted
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let base = self.base_delay(attempt).as_millis() as f64;
        let jitter = self.jitter.clamp(0.0, 1.0);
        // Uniform in [-1.0, 1.0]
        let unit = (rand_u32() as f64 / u32::MAX as f64) * 2.0 - 1.0;
        let millis = (base + base * jitter * unit).clamp(0.0, self.max_delay_ms as f64);
        Some(Duration::from_millis(millis as u64))
    }
}
