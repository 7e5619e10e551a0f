//! Exponential backoff with additive jitter.
//!
//! The delay after a failed attempt `n` (1-based) is
//! `base * multiplier^n`, capped at `max_delay`, plus a random jitter drawn
//! from the configured [`Jitter`]. Without jitter the sequence is strictly
//! increasing until it reaches the cap.

use std::time::Duration;

use rand::Rng;

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Uniformly random extra delay in `0..=max`
    Additive { max: Duration },
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Additive { max } => {
                let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                if max_ms == 0 {
                    return delay;
                }
                let extra = rand::thread_rng().gen_range(0..=max_ms);
                delay.saturating_add(Duration::from_millis(extra))
            }
        }
    }
}

/// Exponential backoff schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base: Duration,
    multiplier: u32,
    max_delay: Duration,
    jitter: Jitter,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
            jitter: Jitter::Additive { max: Duration::from_millis(50) },
        }
    }
}

impl ExponentialBackoff {
    /// Create a doubling backoff starting at `base` with the default cap.
    pub fn new(base: Duration) -> Self {
        Self { base, ..Self::default() }
    }

    /// Override the growth factor (values below 2 are raised to 2).
    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier.max(2);
        self
    }

    /// Cap every computed delay (before jitter) at `max_delay`.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Replace the jitter strategy.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay after failed attempt `attempt` (1-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay after failed attempt `attempt` (1-based), jitter included.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.base_delay(attempt))
    }
}
