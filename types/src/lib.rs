//! Core domain types for lazytask.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The task runtime (`lazytask-core`) and the config loader (`lazytask-config`) both
//! build on these.

#![allow(clippy::missing_errors_doc)]

mod backoff;
mod error;
mod limits;

pub use backoff::{BackoffOptions, FixedJitter, Jitter, backoff_delays, equal_jitter_delay};
pub use error::UsageError;
pub use limits::{Concurrency, TryLimit};
