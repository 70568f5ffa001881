//! Retry policy descriptor handed to the workflow engine at dispatch.
//!
//! This crate never retries anything itself; the engine applies the
//! policy to the workflow's first task.

use std::time::Duration;

/// Delay before the engine's first retry.
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_secs(1);

/// Factor applied to the interval after each failed attempt.
pub const DEFAULT_BACKOFF_COEFFICIENT: f64 = 2.0;

/// Attempts including the first one.
pub const DEFAULT_MAXIMUM_ATTEMPTS: u32 = 3;

/// Engine-side retry parameters for a workflow start.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            backoff_coefficient: DEFAULT_BACKOFF_COEFFICIENT,
            maximum_attempts: DEFAULT_MAXIMUM_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_dispatch_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_interval, Duration::from_secs(1));
        assert_eq!(policy.backoff_coefficient, 2.0);
        assert_eq!(policy.maximum_attempts, 3);
    }
}
