//! Stabilization polling policy

use serde::{Deserialize, Serialize};

/// Bounds and delay hints for stabilization polling.
///
/// The engine never sleeps; these values only shape the
/// `callback_delay_seconds` hint and the attempt limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of stabilization polls before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay hint after the first unsuccessful poll (seconds)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    /// Upper bound for the delay hint (seconds)
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,

    /// Backoff multiplier; 1.0 keeps the delay fixed
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    60
}
fn default_initial_delay() -> u64 {
    5
}
fn default_max_delay() -> u64 {
    60
}
fn default_multiplier() -> f64 {
    1.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay(),
            max_delay_secs: default_max_delay(),
            backoff_multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Fixed delay between polls
    pub fn fixed(max_attempts: u32, delay_secs: u64) -> Self {
        Self {
            max_attempts,
            initial_delay_secs: delay_secs,
            max_delay_secs: delay_secs,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay hint for the given zero-based attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_secs as f64 * self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        (delay as u64).min(self.max_delay_secs)
    }

    /// Whether `attempts` polls use up the budget
    pub fn exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}
