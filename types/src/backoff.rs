//! Exponential backoff with equal jitter.
//!
//! For retry index `i` (0 before the first retry, 1 before the second, etc.):
//!
//! ```text
//! half  = min(cap, step * 2^i) / 2
//! delay = half + uniform(0, half)
//! ```
//!
//! Half of each step is guaranteed; the other half is randomized. Every delay
//! therefore lies in `[min(cap, step * 2^i) / 2, min(cap, step * 2^i)]`.

use std::time::Duration;

use crate::{TryLimit, UsageError};

/// Source of uniform samples in `[0, 1)` for backoff jitter.
///
/// Injected into the backoff driver so retry timing can be made deterministic.
pub trait Jitter: Send + Sync {
    fn sample(&self) -> f64;
}

/// Jitter that always returns the same sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// Settings for a backoff retry driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffOptions {
    /// Total attempts, including the first.
    pub try_limit: TryLimit,
    /// Base delay before the first retry, doubled on each subsequent retry.
    pub backoff_step: Duration,
    /// Upper bound on the exponential delay before jitter.
    pub backoff_cap: Duration,
}

impl BackoffOptions {
    pub fn new(
        try_limit: u32,
        backoff_step: Duration,
        backoff_cap: Duration,
    ) -> Result<Self, UsageError> {
        Ok(Self {
            try_limit: TryLimit::new(try_limit)?,
            backoff_step,
            backoff_cap,
        })
    }

    /// Millisecond convenience constructor.
    pub fn from_millis(try_limit: u32, step_ms: u64, cap_ms: u64) -> Result<Self, UsageError> {
        Self::new(
            try_limit,
            Duration::from_millis(step_ms),
            Duration::from_millis(cap_ms),
        )
    }
}

/// Delay before retry `attempt` given a jitter `sample` in `[0, 1)`.
///
/// Out-of-range and NaN samples are clamped into `[0, 1]`.
#[must_use]
pub fn equal_jitter_delay(attempt: u32, step: Duration, cap: Duration, sample: f64) -> Duration {
    let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
    let capped = step.saturating_mul(factor).min(cap);
    let half = capped / 2;
    let sample = if sample.is_nan() {
        0.0
    } else {
        sample.clamp(0.0, 1.0)
    };
    let jitter_nanos = (half.as_nanos() as f64 * sample) as u64;
    half + Duration::from_nanos(jitter_nanos)
}

/// The `try_limit - 1` inter-attempt delays for one run of a backoff driver.
#[must_use]
pub fn backoff_delays(options: &BackoffOptions, jitter: &dyn Jitter) -> Vec<Duration> {
    (0..options.try_limit.retries())
        .map(|attempt| {
            equal_jitter_delay(
                attempt,
                options.backoff_step,
                options.backoff_cap,
                jitter.sample(),
            )
        })
        .collect()
}
