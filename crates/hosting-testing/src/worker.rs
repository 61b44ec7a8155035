//! A build worker the test drives by hand, so completion order is explicit.

use std::collections::VecDeque;
use std::sync::Mutex;

use hosting_core::{BuildTask, BuildWorker};
use log::trace;

/// Queues submitted builds until the test runs them.
#[derive(Default)]
pub struct ManualWorker {
    queue: Mutex<VecDeque<BuildTask>>,
}

impl ManualWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Runs the oldest queued build. Returns false if none was queued.
    pub fn run_next(&self) -> bool {
        let task = self.queue.lock().unwrap().pop_front();
        self.run(task)
    }

    /// Runs the newest queued build.
    pub fn run_latest(&self) -> bool {
        let task = self.queue.lock().unwrap().pop_back();
        self.run(task)
    }

    /// Runs every queued build in submission order.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Runs every queued build, newest first.
    pub fn run_all_reversed(&self) -> usize {
        let mut ran = 0;
        while self.run_latest() {
            ran += 1;
        }
        ran
    }

    fn run(&self, task: Option<BuildTask>) -> bool {
        match task {
            Some(task) => {
                trace!("manual worker running a build task");
                task();
                true
            }
            None => false,
        }
    }
}

impl BuildWorker for ManualWorker {
    fn submit(&self, task: BuildTask) {
        self.queue.lock().unwrap().push_back(task);
    }
}

impl std::fmt::Debug for ManualWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualWorker")
            .field("pending", &self.pending())
            .finish()
    }
}
