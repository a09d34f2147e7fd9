//! Lazy, re-runnable tasks for lazytask.
//!
//! A [`Task`] wraps an executor that settles a [`Resolver`] on one of two
//! channels. Nothing runs until the task is forked, and every fork runs the
//! executor again. On top of that sit the combinators, the unbounded bulk
//! executors (`all`/`collect`), a bounded worker pool
//! (`all_concurrent`/`collect_concurrent`), and the retry drivers.
//!
//! Runtime-free pieces (plain executors, combinators, `all`, `collect`, `retry`)
//! settle synchronously when their inputs do. The pool, backoff retries and
//! [`Task::from_future`] spawn onto the ambient Tokio runtime.
//!
//! ```
//! use lazytask_core::Task;
//!
//! let task = Task::<u32, String>::of_ok(20)
//!     .map(|n| n + 1)
//!     .and_then(|n| Task::of_ok(n * 2));
//! assert_eq!(task.run_sync(), Ok(Ok(42)));
//! // Tasks are re-runnable.
//! assert_eq!(task.run_sync(), Ok(Ok(42)));
//! ```

mod bulk;
mod combinators;
mod pool;
mod resolver;
mod retry;
mod runtime;
mod task;

pub use lazytask_types::{
    BackoffOptions, Concurrency, FixedJitter, Jitter, TryLimit, UsageError,
};
pub use resolver::Resolver;
pub use retry::ThreadRngJitter;
pub use task::{Fork, Task};
