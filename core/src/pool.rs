//! Bounded-concurrency worker pool.
//!
//! At most `concurrency` forks are in flight at once. Each time one settles a
//! replacement is launched from the unstarted tasks, until every task has run
//! (or, for the fail-fast variant, until the first failure).
//!
//! The pool is driven by a single future spawned on the ambient Tokio runtime.
//! In-flight forks live in a `FuturesUnordered` collector; counters live on the
//! driver and are never shared.

use std::convert::Infallible;
use std::iter;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use lazytask_types::{Concurrency, UsageError};

use crate::runtime::spawn_detached;
use crate::task::Task;

type Settled<T, E> = (usize, Result<T, E>);

struct WorkerPool<T, E> {
    tasks: Arc<[Task<T, E>]>,
    concurrency: usize,
    started: usize,
    completed: usize,
    in_flight: FuturesUnordered<BoxFuture<'static, Settled<T, E>>>,
}

impl<T, E> WorkerPool<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn new(tasks: Arc<[Task<T, E>]>, concurrency: Concurrency) -> Self {
        Self {
            tasks,
            concurrency: concurrency.get(),
            started: 0,
            completed: 0,
            in_flight: FuturesUnordered::new(),
        }
    }

    fn total(&self) -> usize {
        self.tasks.len()
    }

    fn running(&self) -> usize {
        self.in_flight.len()
    }

    /// Launch unstarted tasks until the pool is full or none remain.
    fn replenish(&mut self) {
        while self.running() < self.concurrency && self.started < self.total() {
            let index = self.started;
            let fork = self.tasks[index].run();
            self.in_flight.push(async move { (index, fork.await) }.boxed());
            self.started += 1;
        }
    }

    async fn next_settled(&mut self) -> Option<Settled<T, E>> {
        let settled = self.in_flight.next().await?;
        self.completed += 1;
        Some(settled)
    }

    /// Run to completion, failing fast on the first `Err`.
    async fn drain_all(mut self) -> Result<Vec<T>, E> {
        let mut slots: Vec<Option<T>> = iter::repeat_with(|| None).take(self.total()).collect();
        tracing::debug!(total = self.total(), concurrency = self.concurrency, "Starting bounded pool");
        self.replenish();
        while let Some((index, outcome)) = self.next_settled().await {
            match outcome {
                Ok(value) => {
                    slots[index] = Some(value);
                    self.replenish();
                }
                Err(error) => {
                    tracing::debug!(
                        index,
                        completed = self.completed,
                        running = self.running(),
                        "Bounded pool failed fast"
                    );
                    return Err(error);
                }
            }
        }
        tracing::debug!(completed = self.completed, "Bounded pool drained");
        Ok(slots.into_iter().flatten().collect())
    }

    /// Run to completion, partitioning outcomes in completion order.
    async fn drain_partitioned(mut self) -> (Vec<T>, Vec<E>) {
        let mut oks = Vec::new();
        let mut errs = Vec::new();
        tracing::debug!(total = self.total(), concurrency = self.concurrency, "Starting bounded pool");
        self.replenish();
        while let Some((_, outcome)) = self.next_settled().await {
            match outcome {
                Ok(value) => oks.push(value),
                Err(error) => errs.push(error),
            }
            self.replenish();
        }
        tracing::debug!(
            completed = self.completed,
            failed = errs.len(),
            "Bounded pool drained"
        );
        (oks, errs)
    }
}

impl<T, E> Task<Vec<T>, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Like [`Task::all`], but with at most `concurrency` tasks in flight.
    ///
    /// Results keep input order regardless of completion order. The first failure
    /// settles the combined task and stops further launches; tasks already in
    /// flight run to completion and their outcomes are discarded.
    ///
    /// Non-empty inputs must be forked inside a Tokio runtime.
    pub fn all_concurrent<I>(concurrency: usize, tasks: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = Task<T, E>>,
    {
        let concurrency = Concurrency::new(concurrency)?;
        let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();
        Ok(Self::new(move |resolver| {
            if tasks.is_empty() {
                resolver.ok(Vec::new());
                return;
            }
            let pool = WorkerPool::new(Arc::clone(&tasks), concurrency);
            spawn_detached("bounded pool", async move {
                resolver.resolve(pool.drain_all().await);
            });
        }))
    }
}

impl<T, E> Task<(Vec<T>, Vec<E>), Infallible>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Like [`Task::collect`], but with at most `concurrency` tasks in flight.
    ///
    /// Never fails; failures never halt replenishment.
    ///
    /// Non-empty inputs must be forked inside a Tokio runtime.
    pub fn collect_concurrent<I>(concurrency: usize, tasks: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = Task<T, E>>,
    {
        let concurrency = Concurrency::new(concurrency)?;
        let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();
        Ok(Self::new(move |resolver| {
            if tasks.is_empty() {
                resolver.ok((Vec::new(), Vec::new()));
                return;
            }
            let pool = WorkerPool::new(Arc::clone(&tasks), concurrency);
            spawn_detached("bounded pool", async move {
                resolver.ok(pool.drain_partitioned().await);
            });
        }))
    }
}
