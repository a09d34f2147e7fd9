use thiserror::Error;

/// Misuse of the task API.
///
/// These are programming errors, not domain outcomes: they are returned from the
/// call that was misused and never routed through a task's `Err` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("try limit must be a positive integer, got {value}")]
    InvalidTryLimit { value: u32 },
    #[error("concurrency must be a positive integer, got {value}")]
    InvalidConcurrency { value: usize },
    #[error("executor did not resolve synchronously")]
    NotSynchronous,
}
