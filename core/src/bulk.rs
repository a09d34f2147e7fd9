//! Unbounded bulk executors.
//!
//! `all` and `collect` fork every input task at once and gather outcomes through
//! a shared collector. They need no runtime: when every input settles
//! synchronously, so does the combined task.

use std::convert::Infallible;
use std::iter;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError};

use crate::resolver::Resolver;
use crate::task::Task;

/// The resolver to settle plus the outcome to settle it with.
type Completion<T, E> = (Resolver<T, E>, Result<T, E>);

struct AllCollector<T, E> {
    slots: Vec<Option<T>>,
    remaining: usize,
    resolver: Option<Resolver<Vec<T>, E>>,
}

impl<T, E> AllCollector<T, E> {
    fn new(len: usize, resolver: Resolver<Vec<T>, E>) -> Self {
        Self {
            slots: iter::repeat_with(|| None).take(len).collect(),
            remaining: len,
            resolver: Some(resolver),
        }
    }

    /// Record one settlement. Returns the completion once the combined task is
    /// decided; later settlements are ignored.
    fn record(&mut self, index: usize, outcome: Result<T, E>) -> Option<Completion<Vec<T>, E>> {
        match outcome {
            Ok(value) => {
                self.resolver.as_ref()?;
                self.slots[index] = Some(value);
                self.remaining -= 1;
                if self.remaining > 0 {
                    return None;
                }
                let values = self.slots.drain(..).flatten().collect();
                self.resolver.take().map(|resolver| (resolver, Ok(values)))
            }
            Err(error) => self.resolver.take().map(|resolver| (resolver, Err(error))),
        }
    }
}

struct PartitionCollector<T, E> {
    oks: Vec<T>,
    errs: Vec<E>,
    remaining: usize,
    resolver: Option<Resolver<(Vec<T>, Vec<E>), Infallible>>,
}

impl<T, E> PartitionCollector<T, E> {
    fn record(
        &mut self,
        outcome: Result<T, E>,
    ) -> Option<Completion<(Vec<T>, Vec<E>), Infallible>> {
        match outcome {
            Ok(value) => self.oks.push(value),
            Err(error) => self.errs.push(error),
        }
        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }
        let partition = (mem::take(&mut self.oks), mem::take(&mut self.errs));
        self.resolver.take().map(|resolver| (resolver, Ok(partition)))
    }
}

fn settle<T, E>(completion: Option<Completion<T, E>>) {
    if let Some((resolver, outcome)) = completion {
        resolver.resolve(outcome);
    }
}

impl<T, E> Task<Vec<T>, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Fork every task at once; succeed with all values in input order, or fail
    /// with the first failure observed.
    ///
    /// Tasks still running after a failure are not stopped; their outcomes are
    /// ignored.
    pub fn all<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = Task<T, E>>,
    {
        let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();
        Self::new(move |resolver| {
            if tasks.is_empty() {
                resolver.ok(Vec::new());
                return;
            }
            let collector = Arc::new(Mutex::new(AllCollector::new(tasks.len(), resolver)));
            for (index, task) in tasks.iter().enumerate() {
                let collector = Arc::clone(&collector);
                task.execute(Resolver::new(move |outcome| {
                    let completion = collector
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .record(index, outcome);
                    settle(completion);
                }));
            }
        })
    }
}

impl<T, E> Task<(Vec<T>, Vec<E>), Infallible>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Fork every task at once and always succeed with `(successes, failures)`.
    ///
    /// Within each partition, values appear in completion order.
    pub fn collect<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = Task<T, E>>,
    {
        let tasks: Arc<[Task<T, E>]> = tasks.into_iter().collect();
        Self::new(move |resolver| {
            if tasks.is_empty() {
                resolver.ok((Vec::new(), Vec::new()));
                return;
            }
            let collector = Arc::new(Mutex::new(PartitionCollector {
                oks: Vec::new(),
                errs: Vec::new(),
                remaining: tasks.len(),
                resolver: Some(resolver),
            }));
            for task in tasks.iter() {
                let collector = Arc::clone(&collector);
                task.execute(Resolver::new(move |outcome| {
                    let completion = collector
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .record(outcome);
                    settle(completion);
                }));
            }
        })
    }
}
