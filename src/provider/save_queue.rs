//! # Save Queue and Save Worker
//!
//! All saves go through one bounded FIFO of chunk positions and are executed by
//! exactly one background thread. Serializing the writes keeps the loader free
//! of concurrent writers at the cost of a single bottleneck.
//!
//! ## Backpressure
//! `SaveQueue::offer` never blocks. When the queue is full the position is
//! rejected and the caller gets `false`; it is up to the caller to try again on
//! a later tick.
//!
//! ## Failure handling
//! With `SaveFailurePolicy::FailStop` the first failed save ends the worker for
//! good. The queue stays open, so later offers are still accepted until it
//! fills up, but nothing drains it anymore. With `SaveFailurePolicy::Continue`
//! the failure is logged and counted and the worker carries on. A panic inside
//! the loader always ends the worker, whatever the policy.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use async_channel::{Receiver, Sender, TrySendError};
use log::{debug, error, info, warn};
use web_time::Instant;

use crate::core::SaveFailurePolicy;
use crate::provider::chunk_cache::ChunkCache;
use crate::world::{ChunkLoader, ChunkPosition};

/// Producer side of the bounded save queue.
pub struct SaveQueue {
    sender: Sender<ChunkPosition>,
}

impl SaveQueue {
    /// Creates a queue holding at most `capacity` positions, together with the
    /// receiving end for the save worker.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> (SaveQueue, Receiver<ChunkPosition>) {
        let (sender, receiver) = async_channel::bounded(capacity);
        (SaveQueue { sender }, receiver)
    }

    /// Enqueues `position` unless the queue is full or closed.
    pub fn offer(&self, position: ChunkPosition) -> bool {
        match self.sender.try_send(position) {
            Ok(()) => true,
            Err(TrySendError::Full(position)) => {
                warn!(
                    "Save queue full ({} pending), dropping chunk ({}, {})",
                    self.len(),
                    position.x,
                    position.y
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Positions waiting to be picked up by the worker.
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.sender.capacity().unwrap_or(usize::MAX)
    }

    /// Stops accepting positions. Already queued positions can still be
    /// received, which is what lets the worker drain the queue on shutdown.
    pub fn close(&self) -> bool {
        self.sender.close()
    }
}

/// Lifecycle state of the save worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveWorkerStatus {
    Running,
    /// The queue was closed and fully drained.
    Stopped,
    /// The worker ended because of a save error or a panic.
    Failed(String),
}

/// Snapshot of what the save worker has done so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveWorkerHealth {
    pub status: SaveWorkerStatus,
    pub saved: usize,
    /// Positions dequeued while no chunk was cached there.
    pub skipped: usize,
    pub failed: usize,
    pub last_error: Option<String>,
}

impl Default for SaveWorkerHealth {
    fn default() -> Self {
        SaveWorkerHealth {
            status: SaveWorkerStatus::Running,
            saved: 0,
            skipped: 0,
            failed: 0,
            last_error: None,
        }
    }
}

impl SaveWorkerHealth {
    pub fn is_running(&self) -> bool {
        self.status == SaveWorkerStatus::Running
    }
}

/// Handle to the dedicated save thread.
pub struct SaveWorker {
    handle: Option<JoinHandle<()>>,
    health: Arc<Mutex<SaveWorkerHealth>>,
}

impl SaveWorker {
    /// Starts the save thread.
    ///
    /// # Errors
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn<L: ChunkLoader>(
        loader: Arc<L>,
        world: Arc<L::World>,
        cache: Arc<ChunkCache<L::Chunk>>,
        receiver: Receiver<ChunkPosition>,
        policy: SaveFailurePolicy,
    ) -> std::io::Result<Self> {
        let health = Arc::new(Mutex::new(SaveWorkerHealth::default()));
        let worker_health = health.clone();

        let handle = thread::Builder::new()
            .name("chunk-save-worker".to_string())
            .spawn(move || {
                save_loop::<L>(&loader, &world, &cache, &receiver, policy, &worker_health)
            })?;

        Ok(SaveWorker {
            handle: Some(handle),
            health,
        })
    }

    pub fn health(&self) -> SaveWorkerHealth {
        lock_health(&self.health).clone()
    }

    /// Waits for the thread to exit and returns its final status.
    ///
    /// Only returns once the queue has been closed and drained, or the worker
    /// has failed.
    pub fn join(&mut self) -> SaveWorkerStatus {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                let mut health = lock_health(&self.health);
                health.status = SaveWorkerStatus::Failed("save worker interrupted".to_string());
            }
        }
        self.health().status
    }
}

fn save_loop<L: ChunkLoader>(
    loader: &L,
    world: &L::World,
    cache: &ChunkCache<L::Chunk>,
    receiver: &Receiver<ChunkPosition>,
    policy: SaveFailurePolicy,
    health: &Mutex<SaveWorkerHealth>,
) {
    info!("Save worker started ({:?})", policy);

    while let Ok(position) = receiver.recv_blocking() {
        let (x, z) = (position.x, position.y);

        let Some(chunk) = cache.find(x, z) else {
            warn!("Chunk ({}, {}) is not loaded, skipping save", x, z);
            lock_health(health).skipped += 1;
            continue;
        };

        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let chunk = chunk.get();
            loader.save_chunk(world, &chunk)
        }));

        match outcome {
            Ok(Ok(())) => {
                debug!("Saved chunk ({}, {}) in {:?}", x, z, started.elapsed());
                lock_health(health).saved += 1;
            }
            Ok(Err(e)) => {
                error!("Failed to save chunk ({}, {}): {}", x, z, e);
                let mut health = lock_health(health);
                health.failed += 1;
                health.last_error = Some(e.to_string());

                if policy == SaveFailurePolicy::FailStop {
                    error!("Save worker stopping, later saves will not be processed");
                    health.status = SaveWorkerStatus::Failed(e.to_string());
                    return;
                }
            }
            Err(_) => {
                error!("Save worker interrupted while saving chunk ({}, {})", x, z);
                let mut health = lock_health(health);
                health.failed += 1;
                health.last_error = Some("save worker interrupted".to_string());
                health.status = SaveWorkerStatus::Failed("save worker interrupted".to_string());
                return;
            }
        }
    }

    info!("Save queue closed, save worker exiting");
    lock_health(health).status = SaveWorkerStatus::Stopped;
}

fn lock_health(health: &Mutex<SaveWorkerHealth>) -> MutexGuard<'_, SaveWorkerHealth> {
    health.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::chunk::chunk_position;

    #[test]
    fn accepts_exactly_its_capacity() {
        let (queue, _receiver) = SaveQueue::bounded(300);

        for i in 0..300 {
            assert!(queue.offer(chunk_position(i, 0)), "offer {} rejected", i);
        }
        assert!(!queue.offer(chunk_position(300, 0)));

        assert_eq!(queue.len(), 300);
        assert_eq!(queue.capacity(), 300);
    }

    #[test]
    fn frees_space_as_the_consumer_drains() {
        let (queue, receiver) = SaveQueue::bounded(2);
        assert!(queue.offer(chunk_position(0, 0)));
        assert!(queue.offer(chunk_position(1, 0)));
        assert!(!queue.offer(chunk_position(2, 0)));

        assert_eq!(receiver.try_recv().unwrap(), chunk_position(0, 0));

        assert!(queue.offer(chunk_position(2, 0)));
        assert_eq!(receiver.try_recv().unwrap(), chunk_position(1, 0));
        assert_eq!(receiver.try_recv().unwrap(), chunk_position(2, 0));
    }

    #[test]
    fn closed_queue_rejects_but_still_drains() {
        let (queue, receiver) = SaveQueue::bounded(4);
        assert!(queue.offer(chunk_position(5, 5)));

        assert!(queue.close());
        assert!(!queue.offer(chunk_position(6, 6)));

        assert_eq!(receiver.recv_blocking().unwrap(), chunk_position(5, 5));
        assert!(receiver.recv_blocking().is_err());
    }
}
