//! Spawning onto the ambient Tokio runtime.

use std::future::Future;

use tokio::runtime::Handle;

/// Spawn `work` on the ambient Tokio runtime.
///
/// Outside a runtime the work is dropped with an error event instead of panicking;
/// the fork waiting on it never settles.
pub(crate) fn spawn_detached<F>(what: &'static str, work: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(work);
        }
        Err(err) => {
            tracing::error!(%err, "Cannot start {what} outside a Tokio runtime; fork will never settle");
        }
    }
}
