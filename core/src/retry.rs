//! Retry drivers.
//!
//! `retry` re-runs a task back to back until it succeeds or the try limit is
//! spent. `retry_with_backoff` waits between attempts using exponential
//! backoff with equal jitter (see [`lazytask_types::equal_jitter_delay`]).
//!
//! Both settle with the last observed outcome; no error values are invented.

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use std::vec;

use lazytask_types::{BackoffOptions, Jitter, TryLimit, UsageError, backoff_delays};

use crate::resolver::Resolver;
use crate::runtime::spawn_detached;
use crate::task::Task;

/// Jitter drawn from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl Jitter for ThreadRngJitter {
    fn sample(&self) -> f64 {
        rand::random::<f64>()
    }
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Run `task` up to `try_limit` times in sequence, stopping at the first success.
    ///
    /// A limit of 1 returns `task` itself.
    pub fn retry(try_limit: u32, task: Self) -> Result<Self, UsageError> {
        let try_limit = TryLimit::new(try_limit)?;
        if try_limit.get() == 1 {
            return Ok(task);
        }
        Ok(Self::new(move |resolver| {
            run_attempt(task.clone(), 1, try_limit, resolver);
        }))
    }

    /// Like [`Task::retry`], sleeping between attempts.
    ///
    /// The first attempt runs immediately. Retries must happen inside a Tokio
    /// runtime.
    pub fn retry_with_backoff(options: BackoffOptions, task: Self) -> Self {
        Self::retry_with_backoff_jitter(options, Arc::new(ThreadRngJitter), task)
    }

    /// [`Task::retry_with_backoff`] with an explicit jitter source.
    ///
    /// A fresh delay schedule is drawn each time the returned task is forked.
    pub fn retry_with_backoff_jitter(
        options: BackoffOptions,
        jitter: Arc<dyn Jitter>,
        task: Self,
    ) -> Self {
        if options.try_limit.get() == 1 {
            return task;
        }
        Self::new(move |resolver| {
            let delays = backoff_delays(&options, jitter.as_ref());
            run_backoff_attempt(task.clone(), 1, delays.into_iter(), resolver);
        })
    }
}

/// Where one attempt's outcome goes, depending on whether it settled before
/// `execute` returned.
enum Handoff<T, E> {
    /// `execute` has not returned yet.
    Running,
    /// Settled synchronously; the loop in `run_attempt` picks it up.
    Settled(Result<T, E>),
    /// `execute` returned unsettled; the callback continues the chain.
    Detached(Resolver<T, E>),
    Taken,
}

/// Drive attempts from `attempt` onward.
///
/// Attempts that settle synchronously are looped over in place, so the stack
/// does not grow with the try limit. A deferred attempt hands the chain to its
/// callback, which re-enters here from wherever it settles.
fn run_attempt<T, E>(
    task: Task<T, E>,
    mut attempt: u32,
    try_limit: TryLimit,
    resolver: Resolver<T, E>,
) where
    T: Send + 'static,
    E: Send + 'static,
{
    loop {
        let handoff = Arc::new(Mutex::new(Handoff::Running));
        let callback_handoff = Arc::clone(&handoff);
        let next = task.clone();
        task.execute(Resolver::new(move |outcome: Result<T, E>| {
            let mut state = callback_handoff
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match mem::replace(&mut *state, Handoff::Taken) {
                Handoff::Running => *state = Handoff::Settled(outcome),
                Handoff::Detached(resolver) => {
                    drop(state);
                    continue_after(next, attempt, try_limit, outcome, resolver);
                }
                other => *state = other,
            }
        }));

        let settled = {
            let mut state = handoff.lock().unwrap_or_else(PoisonError::into_inner);
            match mem::replace(&mut *state, Handoff::Taken) {
                Handoff::Settled(outcome) => outcome,
                _ => {
                    *state = Handoff::Detached(resolver);
                    return;
                }
            }
        };

        if settled.is_err() && attempt < try_limit.get() {
            tracing::debug!(attempt, try_limit = try_limit.get(), "Retrying task after failure");
            attempt += 1;
        } else {
            resolver.resolve(settled);
            return;
        }
    }
}

fn continue_after<T, E>(
    task: Task<T, E>,
    attempt: u32,
    try_limit: TryLimit,
    outcome: Result<T, E>,
    resolver: Resolver<T, E>,
) where
    T: Send + 'static,
    E: Send + 'static,
{
    if outcome.is_err() && attempt < try_limit.get() {
        tracing::debug!(attempt, try_limit = try_limit.get(), "Retrying task after failure");
        run_attempt(task, attempt + 1, try_limit, resolver);
    } else {
        resolver.resolve(outcome);
    }
}

fn run_backoff_attempt<T, E>(
    task: Task<T, E>,
    attempt: u32,
    mut delays: vec::IntoIter<Duration>,
    resolver: Resolver<T, E>,
) where
    T: Send + 'static,
    E: Send + 'static,
{
    let next = task.clone();
    task.execute(Resolver::new(move |outcome: Result<T, E>| {
        if outcome.is_ok() {
            resolver.resolve(outcome);
            return;
        }
        let Some(delay) = delays.next() else {
            resolver.resolve(outcome);
            return;
        };
        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis(),
            "Retrying task after backoff"
        );
        spawn_detached("backoff retry", async move {
            tokio::time::sleep(delay).await;
            run_backoff_attempt(next, attempt + 1, delays, resolver);
        });
    }));
}
