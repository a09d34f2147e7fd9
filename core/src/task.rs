//! The `Task` type: construction and execution entry points.
//!
//! A `Task` owns a single executor and does nothing until it is forked. Every
//! `fork`/`run`/`run_sync`/`exec` call invokes the executor once, so the same
//! task value can be run any number of times, each run independent of the rest.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use lazytask_types::UsageError;
use tokio::sync::oneshot;

use crate::resolver::Resolver;
use crate::runtime::spawn_detached;

type Executor<T, E> = dyn Fn(Resolver<T, E>) + Send + Sync;

/// A lazy, re-runnable computation that settles to `Ok(T)` or `Err(E)`.
///
/// Cloning is cheap and yields a task sharing the same executor.
#[must_use = "tasks are lazy and do nothing until forked"]
pub struct Task<T, E> {
    executor: Arc<Executor<T, E>>,
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<T, E> fmt::Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wrap an executor. Nothing runs until the task is forked.
    ///
    /// The executor must settle the resolver exactly once, either before returning
    /// or later from a spawned continuation.
    pub fn new(executor: impl Fn(Resolver<T, E>) + Send + Sync + 'static) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }

    /// A task that always succeeds with `value`.
    pub fn of_ok(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move |resolver| resolver.ok(value.clone()))
    }

    /// A task that always fails with `error`.
    pub fn of_err(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move |resolver| resolver.err(error.clone()))
    }

    /// A task that replays an already-settled outcome.
    pub fn from_result(outcome: Result<T, E>) -> Self
    where
        T: Clone + Sync,
        E: Clone + Sync,
    {
        Self::new(move |resolver| resolver.resolve(outcome.clone()))
    }

    /// A task that succeeds with the value if present, or fails with `error`.
    pub fn from_option(value: Option<T>, error: E) -> Self
    where
        T: Clone + Sync,
        E: Clone + Sync,
    {
        Self::from_result(value.ok_or(error))
    }

    /// A task backed by an async computation.
    ///
    /// `factory` is called once per fork and the resulting future is spawned on the
    /// ambient Tokio runtime.
    pub fn from_future<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(move |resolver| {
            let future = factory();
            spawn_detached("future-backed task", async move {
                resolver.resolve(future.await);
            });
        })
    }

    pub(crate) fn execute(&self, resolver: Resolver<T, E>) {
        (self.executor)(resolver);
    }

    /// Begin execution, mapping whichever channel settles.
    ///
    /// The executor runs before `fork` returns; the returned [`Fork`] resolves once
    /// the executor settles.
    pub fn fork<U, F>(
        &self,
        on_ok: impl FnOnce(T) -> U + Send + 'static,
        on_err: impl FnOnce(E) -> F + Send + 'static,
    ) -> Fork<U, F>
    where
        U: Send + 'static,
        F: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.execute(Resolver::new(move |outcome: Result<T, E>| {
            // The caller may have dropped the fork; the outcome is discarded then.
            let _ = tx.send(outcome.map(on_ok).map_err(on_err));
        }));
        Fork { receiver: Some(rx) }
    }

    /// Begin execution and resolve with the task's outcome.
    pub fn run(&self) -> Fork<T, E> {
        self.fork(|value| value, |error| error)
    }

    /// Execute and return the outcome without suspending.
    ///
    /// Fails with [`UsageError::NotSynchronous`] when the executor has not settled by
    /// the time it returns.
    pub fn run_sync(&self) -> Result<Result<T, E>, UsageError> {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        self.execute(Resolver::new(move |outcome| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        }));
        let outcome = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        outcome.ok_or(UsageError::NotSynchronous)
    }

    /// Fire and forget: run the task and discard both outcomes.
    pub fn exec(&self) {
        self.execute(Resolver::new(|_| {}));
    }

    /// True when both tasks share one executor, i.e. one is a clone of the other.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.executor, &other.executor)
    }
}

impl<T, E> IntoFuture for Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = Fork<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.run()
    }
}

impl<T, E> IntoFuture for &Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = Fork<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.run()
    }
}

/// Deferred outcome of one task execution.
///
/// Resolves exactly once. If the executor drops its resolver without settling,
/// the fork stays pending forever.
#[must_use = "the outcome of a fork is lost unless it is awaited"]
pub struct Fork<T, E> {
    receiver: Option<oneshot::Receiver<Result<T, E>>>,
}

impl<T, E> fmt::Debug for Fork<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fork")
            .field("settled", &self.receiver.is_none())
            .finish()
    }
}

impl<T, E> Future for Fork<T, E> {
    type Output = Result<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Pending;
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => {
                self.receiver = None;
                Poll::Ready(outcome)
            }
            Poll::Ready(Err(_)) => {
                self.receiver = None;
                tracing::warn!("Task resolver dropped without settling; fork will never complete");
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
