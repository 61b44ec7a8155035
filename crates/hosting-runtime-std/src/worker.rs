use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use hosting_core::{BuildTask, BuildWorker};
use log::{debug, error, warn};

/// Runs builds one at a time on a dedicated background thread.
///
/// Tasks run in submission order. Dropping the worker lets queued tasks finish
/// and joins the thread.
pub struct StdBuildWorker {
    name: String,
    sender: Mutex<Option<Sender<BuildTask>>>,
    handle: Option<JoinHandle<()>>,
}

impl StdBuildWorker {
    pub const DEFAULT_NAME: &'static str = "hosting-build";

    pub fn new() -> io::Result<Self> {
        Self::named(Self::DEFAULT_NAME)
    }

    pub fn named(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel::<BuildTask>();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            while let Ok(task) = receiver.recv() {
                run_task(task);
            }
        })?;
        debug!("started build worker {name}");
        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl BuildWorker for StdBuildWorker {
    fn submit(&self, task: BuildTask) {
        let rejected = match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.send(task).err().map(|err| err.0),
            None => Some(task),
        };
        if let Some(task) = rejected {
            warn!("build worker {} is gone; running task inline", self.name);
            run_task(task);
        }
    }
}

impl Drop for StdBuildWorker {
    fn drop(&mut self) {
        // Closing the channel ends the receive loop once the queue drains.
        self.sender.lock().unwrap().take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("build worker {} panicked", self.name);
            }
        }
    }
}

impl fmt::Debug for StdBuildWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdBuildWorker").field("name", &self.name).finish()
    }
}

/// Spawns a fresh named thread for every build.
///
/// Builds may finish in any order, which exercises the hosting controller's
/// generation check the same way a concurrent queue would.
#[derive(Debug, Default)]
pub struct ThreadPerTaskWorker {
    spawned: AtomicUsize,
}

impl ThreadPerTaskWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Threads spawned so far.
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl BuildWorker for ThreadPerTaskWorker {
    fn submit(&self, task: BuildTask) {
        let n = self.spawned.fetch_add(1, Ordering::SeqCst);
        // A failed spawn drops its closure, so the task travels through a slot.
        let slot = Arc::new(Mutex::new(Some(task)));
        let remote = Arc::clone(&slot);
        let spawned = thread::Builder::new()
            .name(format!("hosting-build-{n}"))
            .spawn(move || {
                if let Some(task) = remote.lock().unwrap().take() {
                    run_task(task);
                }
            });
        if let Err(err) = spawned {
            warn!("failed to spawn build thread: {err}; running task inline");
            if let Some(task) = slot.lock().unwrap().take() {
                run_task(task);
            }
        }
    }
}

fn run_task(task: BuildTask) {
    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
        error!("build task panicked on {:?}", thread::current().name());
    }
}
