//! Where asynchronous builds run.

use std::sync::Arc;

/// A unit of build work.
pub type BuildTask = Box<dyn FnOnce() + Send + 'static>;

/// Executes build tasks off the caller's stack.
///
/// Implementations may run tasks on any thread and in any order; the hosting
/// controller's generation check makes completion order irrelevant.
pub trait BuildWorker: Send + Sync {
    fn submit(&self, task: BuildTask);
}

impl<W: BuildWorker + ?Sized> BuildWorker for Arc<W> {
    fn submit(&self, task: BuildTask) {
        (**self).submit(task)
    }
}

/// Runs each task immediately on the submitting thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineWorker;

impl BuildWorker for InlineWorker {
    fn submit(&self, task: BuildTask) {
        task();
    }
}
