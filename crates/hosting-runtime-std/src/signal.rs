use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::task::Waker;
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use futures_task::ArcWake;

/// Wake signal for a render loop.
///
/// A hosting controller wakes it whenever an asynchronous build finishes.
/// The render loop polls [`take_pending`](Self::take_pending) or parks in
/// [`wait_timeout`](Self::wait_timeout) and then calls
/// `process_completed` on the controller.
pub struct RenderSignal {
    pending: AtomicBool,
    wakes: AtomicUsize,
    render_thread: RwLock<Option<Thread>>,
    callback: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
}

impl RenderSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: AtomicBool::new(false),
            wakes: AtomicUsize::new(0),
            render_thread: RwLock::new(None),
            callback: RwLock::new(None),
        })
    }

    /// Unparks the calling thread on every wake.
    pub fn register_current_thread(&self) {
        *self.render_thread.write().unwrap() = Some(thread::current());
    }

    pub fn clear_thread(&self) {
        *self.render_thread.write().unwrap() = None;
    }

    /// Registers a callback invoked on every wake, from the waking thread.
    pub fn set_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.callback.write().unwrap() = Some(Arc::new(callback));
    }

    pub fn clear_callback(&self) {
        *self.callback.write().unwrap() = None;
    }

    /// Returns whether a wake arrived since the last call.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Total wakes received.
    pub fn wakes(&self) -> usize {
        self.wakes.load(Ordering::SeqCst)
    }

    pub fn waker(self: &Arc<Self>) -> Waker {
        futures_task::waker(Arc::clone(self))
    }

    pub fn notify(&self) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
        self.pending.store(true, Ordering::SeqCst);
        let callback = self.callback.read().unwrap().clone();
        if let Some(callback) = callback {
            callback();
        }
        if let Some(thread) = self.render_thread.read().unwrap().as_ref() {
            thread.unpark();
        }
    }

    /// Parks the calling thread until a wake is pending or `timeout` passes,
    /// then consumes the pending flag. Only wakes after
    /// [`register_current_thread`](Self::register_current_thread) unpark early.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.take_pending() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

impl ArcWake for RenderSignal {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.notify();
    }
}

impl fmt::Debug for RenderSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSignal")
            .field("pending", &self.pending.load(Ordering::SeqCst))
            .field("wakes", &self.wakes.load(Ordering::SeqCst))
            .finish()
    }
}
