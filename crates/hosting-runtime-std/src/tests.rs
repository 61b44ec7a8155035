use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hosting_core::BuildWorker;

use crate::{RenderSignal, StdBuildWorker, ThreadPerTaskWorker};

#[test]
fn std_worker_runs_tasks_in_order_on_its_thread() {
    let worker = StdBuildWorker::named("build-test").expect("spawn worker");
    let (tx, rx) = mpsc::channel();
    for i in 0..5 {
        let tx = tx.clone();
        worker.submit(Box::new(move || {
            let name = thread::current().name().map(str::to_owned);
            tx.send((i, name)).expect("send");
        }));
    }
    drop(worker);
    drop(tx);
    let seen: Vec<(i32, Option<String>)> = rx.iter().collect();
    assert_eq!(seen.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    assert!(seen
        .iter()
        .all(|(_, name)| name.as_deref() == Some("build-test")));
}

#[test]
fn std_worker_survives_a_panicking_task() {
    let worker = StdBuildWorker::new().expect("spawn worker");
    assert_eq!(worker.name(), StdBuildWorker::DEFAULT_NAME);
    let (tx, rx) = mpsc::channel();
    worker.submit(Box::new(|| panic!("boom")));
    worker.submit(Box::new(move || tx.send(7).expect("send")));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(7));
}

#[test]
fn thread_per_task_worker_spawns_per_build() {
    let worker = ThreadPerTaskWorker::new();
    let (tx, rx) = mpsc::channel();
    for _ in 0..3 {
        let tx = tx.clone();
        worker.submit(Box::new(move || {
            let name = thread::current().name().unwrap_or("").to_owned();
            tx.send(name).expect("send");
        }));
    }
    drop(tx);
    let mut names: Vec<String> = rx.iter().collect();
    names.sort();
    assert_eq!(names, vec!["hosting-build-0", "hosting-build-1", "hosting-build-2"]);
    assert_eq!(worker.spawned(), 3);
}

#[test]
fn signal_records_wakes_until_taken() {
    let signal = RenderSignal::new();
    assert!(!signal.take_pending());
    let waker = signal.waker();
    waker.wake_by_ref();
    waker.wake();
    assert!(signal.is_pending());
    assert_eq!(signal.wakes(), 2);
    assert!(signal.take_pending());
    assert!(!signal.take_pending());
}

#[test]
fn signal_unparks_the_render_thread() {
    let signal = RenderSignal::new();
    signal.register_current_thread();
    let waker = signal.waker();
    let remote = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        waker.wake();
    });
    assert!(signal.wait_timeout(Duration::from_secs(5)));
    remote.join().expect("waking thread");
    assert!(!signal.wait_timeout(Duration::from_millis(1)));
}

#[test]
fn signal_invokes_the_callback() {
    let signal = RenderSignal::new();
    let (tx, rx) = mpsc::channel();
    let tx = std::sync::Mutex::new(tx);
    signal.set_callback(move || {
        let _ = tx.lock().unwrap().send(());
    });
    let signal_for_thread = Arc::clone(&signal);
    thread::spawn(move || signal_for_thread.notify())
        .join()
        .expect("notify thread");
    assert_eq!(rx.try_recv(), Ok(()));
    signal.clear_callback();
    signal.notify();
    assert!(rx.try_recv().is_err());
}
