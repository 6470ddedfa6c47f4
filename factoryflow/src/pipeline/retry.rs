//! Retry policies for stage attempts.
//!
//! A stage gets `max_retries + 1` attempts. The policy decides how long to
//! wait before each retry; the runner owns the loop.

use crate::config::WorkflowConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Decides how many retries a stage gets and how long to wait between them.
pub trait RetryPolicy: Send + Sync + Debug {
    /// Retries allowed after the first attempt. The runner never exceeds the
    /// run config's `max_retries`, whatever this returns.
    fn max_retries(&self) -> u32;

    /// Delay before retry number `retry` (1-based).
    fn delay_for(&self, retry: u32) -> Duration;

    /// Total attempts including the first.
    fn max_attempts(&self) -> u32 {
        self.max_retries().saturating_add(1)
    }
}

/// Waits the same delay before every retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before each retry.
    pub delay: Duration,
}

impl FixedDelay {
    /// Creates a fixed-delay policy.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Takes `max_retries` and `retry_delay` from the run config.
    #[must_use]
    pub const fn from_config(config: &WorkflowConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay)
    }
}

impl RetryPolicy for FixedDelay {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn delay_for(&self, _retry: u32) -> Duration {
        self.delay
    }
}

/// Jitter strategy to prevent thundering herd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JitterStrategy {
    /// No jitter
    #[default]
    None,
    /// Random from 0 to delay
    Full,
    /// Half fixed, half random
    Equal,
}

/// delay = base * 2^(retry - 1), capped at `max_delay`, then jittered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Jitter applied after capping.
    pub jitter: JitterStrategy,
}

impl ExponentialBackoff {
    /// Creates an exponential policy without jitter and a 60 second cap.
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(60),
            jitter: JitterStrategy::None,
        }
    }

    /// Sets the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = jitter;
        self
    }

    fn capped_millis(&self, retry: u32) -> u64 {
        let base = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let exponent = retry.saturating_sub(1);
        base.saturating_mul(2u64.saturating_pow(exponent)).min(max)
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let delay = self.capped_millis(retry);

        let jittered = match self.jitter {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
        };

        Duration::from_millis(jittered)
    }
}
