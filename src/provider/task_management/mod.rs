//! # Task Management System
//!
//! A fixed pool of worker threads that run [`Task`]s off the caller's thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: owns the workers and the sending half of the task channel
//! - `Task`: a unit of work that runs once on whichever worker picks it up
//!
//! All workers pull from one shared channel, so a long task never holds up
//! queued work while another worker is idle. Publishing never blocks: the
//! channel is unbounded and the caller only pays for the send.
//!
//! ## Task Lifecycle
//! 1. A task is published via `TaskManager::publish_task()`
//! 2. The first idle worker receives it and calls `process()`
//! 3. The in-flight counter drops once `process()` returns or panics
//! 4. `shutdown()` closes the channel; workers finish what is queued and exit
//!
//! ## Example Usage
//! ```rust
//! use chunk_provider::provider::task_management::TaskManager;
//!
//! let mut task_manager = TaskManager::new(4, "example-worker").unwrap();
//! task_manager.publish_task(Box::new(|| println!("hello from a worker")));
//! assert_eq!(task_manager.shutdown(), 1);
//! ```

pub mod task;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, error, info};
use task::Task;

type BoxedTask = Box<dyn Task>;

/// Manages a pool of worker threads and hands tasks to them.
///
/// # Implementation Notes
/// - `publish_task` takes `&self`, so the manager can be shared between callers
/// - Drop-safe: dropping the manager runs `shutdown()`
/// - Panic-safe: a panicking task is logged and the worker keeps running
pub struct TaskManager {
    task_sender: Option<Sender<BoxedTask>>,
    workers: Vec<JoinHandle<()>>,
    tasks_in_flight: Arc<AtomicUsize>,
    tasks_completed: Arc<AtomicUsize>,
}

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` threads named
    /// `<name>-<index>`.
    ///
    /// # Errors
    /// Returns the OS error if a worker thread cannot be spawned. Workers that
    /// were already started are shut down again.
    pub fn new(num_workers: usize, name: &str) -> std::io::Result<Self> {
        let (task_tx, task_rx) = channel::<BoxedTask>();
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut task_manager = TaskManager {
            task_sender: Some(task_tx),
            workers: Vec::with_capacity(num_workers),
            tasks_in_flight: Arc::new(AtomicUsize::new(0)),
            tasks_completed: Arc::new(AtomicUsize::new(0)),
        };

        for index in 0..num_workers {
            let task_rx = task_rx.clone();
            let tasks_in_flight = task_manager.tasks_in_flight.clone();
            let tasks_completed = task_manager.tasks_completed.clone();

            let worker = thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || worker_loop(task_rx, tasks_in_flight, tasks_completed))?;
            task_manager.workers.push(worker);
        }

        info!("Started {} {} threads", num_workers, name);
        Ok(task_manager)
    }

    /// Publishes a task for execution and returns immediately.
    ///
    /// # Returns
    /// - `true` if the task was queued for a worker
    /// - `false` if the manager has been shut down; the task is dropped
    pub fn publish_task(&self, task: BoxedTask) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };

        self.tasks_in_flight.fetch_add(1, Ordering::SeqCst);
        if sender.send(task).is_err() {
            self.tasks_in_flight.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Tasks published but not yet finished, including the ones running now.
    pub fn tasks_in_flight(&self) -> usize {
        self.tasks_in_flight.load(Ordering::SeqCst)
    }

    /// Tasks that ran to completion (or panicked) since the manager started.
    pub fn tasks_completed(&self) -> usize {
        self.tasks_completed.load(Ordering::SeqCst)
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Stops accepting tasks, lets the workers drain everything already
    /// published, and joins them.
    ///
    /// Returns the total number of tasks completed. Calling it again is a no-op.
    pub fn shutdown(&mut self) -> usize {
        if self.task_sender.take().is_none() {
            return self.tasks_completed();
        }

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("A task worker exited abnormally");
            }
        }

        let completed = self.tasks_completed();
        info!("Task workers stopped after {} tasks", completed);
        completed
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    task_rx: Arc<Mutex<Receiver<BoxedTask>>>,
    tasks_in_flight: Arc<AtomicUsize>,
    tasks_completed: Arc<AtomicUsize>,
) {
    loop {
        // The guard is dropped at the end of this statement, before the task runs.
        let next = task_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();

        let Ok(task) = next else {
            debug!("Task channel closed, worker exiting");
            break;
        };

        if panic::catch_unwind(AssertUnwindSafe(|| task.process())).is_err() {
            error!("Task panicked on {:?}", thread::current().name());
        }

        tasks_completed.fetch_add(1, Ordering::SeqCst);
        tasks_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    #[test]
    fn runs_every_published_task() {
        let mut task_manager = TaskManager::new(3, "test-worker").unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = counter.clone();
            assert!(task_manager.publish_task(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })));
        }

        assert_eq!(task_manager.shutdown(), 100);
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(task_manager.tasks_in_flight(), 0);
    }

    #[test]
    fn tasks_run_in_parallel() {
        let workers = 4;
        let mut task_manager = TaskManager::new(workers, "test-worker").unwrap();
        // Only completes if all four tasks are running at the same time.
        let barrier = Arc::new(Barrier::new(workers));

        for _ in 0..workers {
            let barrier = barrier.clone();
            task_manager.publish_task(Box::new(move || {
                barrier.wait();
            }));
        }

        assert_eq!(task_manager.shutdown(), workers);
    }

    #[test]
    fn panicking_task_does_not_kill_the_worker() {
        let mut task_manager = TaskManager::new(1, "test-worker").unwrap();
        let ran_after = Arc::new(AtomicUsize::new(0));

        task_manager.publish_task(Box::new(|| {
            panic!("task failure");
        }));
        let flag = ran_after.clone();
        task_manager.publish_task(Box::new(move || {
            flag.store(1, Ordering::SeqCst);
        }));

        assert_eq!(task_manager.shutdown(), 2);
        assert_eq!(ran_after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn publishing_after_shutdown_is_rejected() {
        let mut task_manager = TaskManager::new(2, "test-worker").unwrap();
        task_manager.shutdown();

        assert!(!task_manager.publish_task(Box::new(|| {})));
        assert_eq!(task_manager.tasks_in_flight(), 0);
        assert_eq!(task_manager.num_workers(), 0);
    }
}
