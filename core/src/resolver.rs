//! The settlement handle passed to a task's executor.

use std::fmt;

type Settle<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

/// Two-channel settlement handle for one execution of a task.
///
/// Every settling method consumes the resolver, so a single execution can settle
/// at most once. Dropping a resolver without settling leaves that execution
/// unsettled forever.
///
/// ```compile_fail
/// use lazytask_core::Resolver;
///
/// let resolver = Resolver::<u8, u8>::new(|_| {});
/// resolver.ok(1);
/// resolver.err(2);
/// ```
#[must_use = "a task whose resolver is never settled never completes"]
pub struct Resolver<T, E> {
    settle: Settle<T, E>,
}

impl<T, E> Resolver<T, E> {
    /// Wrap the callback that receives this execution's outcome.
    pub fn new(settle: impl FnOnce(Result<T, E>) + Send + 'static) -> Self {
        Self {
            settle: Box::new(settle),
        }
    }

    /// Settle on the success channel.
    pub fn ok(self, value: T) {
        (self.settle)(Ok(value));
    }

    /// Settle on the failure channel.
    pub fn err(self, error: E) {
        (self.settle)(Err(error));
    }

    /// Settle on whichever channel `outcome` carries.
    pub fn resolve(self, outcome: Result<T, E>) {
        (self.settle)(outcome);
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}
