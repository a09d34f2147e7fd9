//! Transformation, sequencing, alternation, and side-effect combinators.
//!
//! Every combinator consumes `self` and returns a new task whose executor forks
//! the original and post-processes its outcome. No combinator runs anything
//! until the returned task is forked.

use std::sync::Arc;

use crate::resolver::Resolver;
use crate::task::Task;

impl<T, E> Task<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Build a task that runs `self` and hands its outcome to `handler` together
    /// with the outer resolver.
    fn intercept<U, F, H>(self, handler: H) -> Task<U, F>
    where
        U: Send + 'static,
        F: Send + 'static,
        H: Fn(Result<T, E>, Resolver<U, F>) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        Task::new(move |resolver| {
            let handler = Arc::clone(&handler);
            self.execute(Resolver::new(move |outcome| handler(outcome, resolver)));
        })
    }

    pub fn map<U, Op>(self, op: Op) -> Task<U, E>
    where
        U: Send + 'static,
        Op: Fn(T) -> U + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| resolver.resolve(outcome.map(&op)))
    }

    /// Replace the success value with `value`.
    pub fn map_to<U>(self, value: U) -> Task<U, E>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.map(move |_| value.clone())
    }

    pub fn map_err<F, Op>(self, op: Op) -> Task<T, F>
    where
        F: Send + 'static,
        Op: Fn(E) -> F + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| resolver.resolve(outcome.map_err(&op)))
    }

    /// Replace the failure value with `error`.
    pub fn map_err_to<F>(self, error: F) -> Task<T, F>
    where
        F: Clone + Send + Sync + 'static,
    {
        self.map_err(move |_| error.clone())
    }

    pub fn map_both<U, F, OkOp, ErrOp>(self, ok_op: OkOp, err_op: ErrOp) -> Task<U, F>
    where
        U: Send + 'static,
        F: Send + 'static,
        OkOp: Fn(T) -> U + Send + Sync + 'static,
        ErrOp: Fn(E) -> F + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| {
            resolver.resolve(outcome.map(&ok_op).map_err(&err_op));
        })
    }

    /// Swap the success and failure channels.
    pub fn invert(self) -> Task<E, T> {
        self.intercept(|outcome, resolver| match outcome {
            Ok(value) => resolver.err(value),
            Err(error) => resolver.ok(error),
        })
    }

    /// Fork `next` only if `self` succeeds; failures pass through unchanged.
    pub fn and<U>(self, next: Task<U, E>) -> Task<U, E>
    where
        U: Send + 'static,
    {
        self.intercept(move |outcome, resolver| match outcome {
            Ok(_) => next.execute(resolver),
            Err(error) => resolver.err(error),
        })
    }

    /// Fork the task built from the success value; failures pass through unchanged.
    pub fn and_then<U, Next>(self, next: Next) -> Task<U, E>
    where
        U: Send + 'static,
        Next: Fn(T) -> Task<U, E> + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| match outcome {
            Ok(value) => next(value).execute(resolver),
            Err(error) => resolver.err(error),
        })
    }

    /// Fork `alternative` only if `self` fails; successes pass through unchanged.
    pub fn or<F>(self, alternative: Task<T, F>) -> Task<T, F>
    where
        F: Send + 'static,
    {
        self.intercept(move |outcome, resolver| match outcome {
            Ok(value) => resolver.ok(value),
            Err(_) => alternative.execute(resolver),
        })
    }

    /// Fork the task built from the failure value; successes pass through unchanged.
    pub fn or_else<F, Alt>(self, alternative: Alt) -> Task<T, F>
    where
        F: Send + 'static,
        Alt: Fn(E) -> Task<T, F> + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| match outcome {
            Ok(value) => resolver.ok(value),
            Err(error) => alternative(error).execute(resolver),
        })
    }

    pub fn tap<Op>(self, op: Op) -> Self
    where
        Op: Fn(&T) + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| {
            if let Ok(value) = &outcome {
                op(value);
            }
            resolver.resolve(outcome);
        })
    }

    pub fn tap_err<Op>(self, op: Op) -> Self
    where
        Op: Fn(&E) + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| {
            if let Err(error) = &outcome {
                op(error);
            }
            resolver.resolve(outcome);
        })
    }

    /// Run `op` once the task settles on either channel, before the outcome is
    /// passed on.
    pub fn finally<Op>(self, op: Op) -> Self
    where
        Op: Fn() + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| {
            op();
            resolver.resolve(outcome);
        })
    }

    /// On success, start `effect` and discard its outcome.
    pub fn and_effect<U, G>(self, effect: Task<U, G>) -> Self
    where
        U: Send + 'static,
        G: Send + 'static,
    {
        self.intercept(move |outcome, resolver| {
            if outcome.is_ok() {
                effect.exec();
            }
            resolver.resolve(outcome);
        })
    }

    /// On success, start the effect built from the success value and discard its
    /// outcome.
    pub fn and_then_effect<U, G, Effect>(self, effect: Effect) -> Self
    where
        U: Send + 'static,
        G: Send + 'static,
        Effect: Fn(&T) -> Task<U, G> + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| {
            if let Ok(value) = &outcome {
                effect(value).exec();
            }
            resolver.resolve(outcome);
        })
    }

    /// On failure, start `effect` and discard its outcome.
    pub fn or_effect<U, G>(self, effect: Task<U, G>) -> Self
    where
        U: Send + 'static,
        G: Send + 'static,
    {
        self.intercept(move |outcome, resolver| {
            if outcome.is_err() {
                effect.exec();
            }
            resolver.resolve(outcome);
        })
    }

    /// On failure, start the effect built from the failure value and discard its
    /// outcome.
    pub fn or_else_effect<U, G, Effect>(self, effect: Effect) -> Self
    where
        U: Send + 'static,
        G: Send + 'static,
        Effect: Fn(&E) -> Task<U, G> + Send + Sync + 'static,
    {
        self.intercept(move |outcome, resolver| {
            if let Err(error) = &outcome {
                effect(error).exec();
            }
            resolver.resolve(outcome);
        })
    }
}
