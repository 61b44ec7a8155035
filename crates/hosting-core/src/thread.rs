//! Guard for APIs confined to the rendering thread.

use std::thread::{self, ThreadId};

/// The thread that owns a live view hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderThread {
    id: ThreadId,
}

impl RenderThread {
    /// Binds to the calling thread.
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Panics unless called on the rendering thread.
    #[track_caller]
    pub fn assert_current(&self, api: &str) {
        if !self.is_current() {
            panic!(
                "{api} must be called on the rendering thread ({:?}), called from {:?}",
                self.id,
                thread::current().id()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_passes_on_owner() {
        let render = RenderThread::current();
        render.assert_current("apply");
        assert!(render.is_current());
    }

    #[test]
    fn other_threads_are_rejected() {
        let render = RenderThread::current();
        let outcome = thread::spawn(move || {
            std::panic::catch_unwind(|| render.assert_current("apply")).is_err()
        })
        .join()
        .expect("worker thread");
        assert!(outcome);
    }
}
