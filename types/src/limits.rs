//! Validated scheduling limits.

use std::fmt;
use std::num::{NonZeroU32, NonZeroUsize};

use crate::UsageError;

/// Maximum number of attempts a retry driver may make, including the first.
///
/// Guaranteed to be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TryLimit(NonZeroU32);

impl TryLimit {
    pub fn new(value: u32) -> Result<Self, UsageError> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(UsageError::InvalidTryLimit { value })
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Number of retries after the first attempt.
    #[must_use]
    pub const fn retries(self) -> u32 {
        self.0.get() - 1
    }
}

impl TryFrom<u32> for TryLimit {
    type Error = UsageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for TryLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cap on simultaneously in-flight tasks in a bounded pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Concurrency(NonZeroUsize);

impl Concurrency {
    pub fn new(value: usize) -> Result<Self, UsageError> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or(UsageError::InvalidConcurrency { value })
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for Concurrency {
    type Error = UsageError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
