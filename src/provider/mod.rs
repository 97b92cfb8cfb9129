//! # Chunk Provider
//!
//! `ChunkProvider` keeps a simulation loop from ever waiting on chunk storage.
//!
//! ## Architecture Overview
//!
//! - `ChunkCache`: the chunks that are currently loaded, behind one mutex
//! - `TaskManager`: a fixed pool of load workers (10 by default)
//! - `SaveQueue` + `SaveWorker`: a bounded FIFO of positions drained by a
//!   single save thread
//!
//! ## Data Flow
//!
//! 1. `load_chunk_at` publishes a `ChunkLoadTask` and returns a `LoadTicket`
//! 2. A load worker calls `ChunkLoader::load_chunk` and adds the chunk to the cache
//! 3. `save_chunk_at` offers the position to the save queue (never blocks)
//! 4. The save worker takes positions in order, looks them up in the cache and
//!    calls `ChunkLoader::save_chunk`
//!
//! ## Ordering
//!
//! Saves are processed strictly in the order they were accepted. Loads have no
//! ordering at all, neither among themselves nor against saves: a save queued
//! right after a load of the same position may find nothing in the cache yet.
//!
//! ## Usage
//! ```rust
//! use chunk_provider::core::ProviderConfig;
//! use chunk_provider::provider::ChunkProvider;
//! use chunk_provider::world::{JsonFileChunkLoader, PerlinChunkGenerator, WorldInfo};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let loader = JsonFileChunkLoader::new(dir.path(), PerlinChunkGenerator::new(0));
//! let provider =
//!     ChunkProvider::new(loader, WorldInfo::new("doc"), ProviderConfig::default()).unwrap();
//!
//! provider.load_chunk_at(3, 4).wait().unwrap();
//! assert_eq!(provider.get_chunk_at(3, 4).unwrap().get().x(), 3);
//! assert!(provider.save_chunk_at(3, 4));
//!
//! let report = provider.shutdown();
//! assert_eq!(report.saves_persisted, 1);
//! ```

pub mod chunk_cache;
pub mod load_ticket;
pub mod save_queue;
pub mod task_management;
pub mod tasks;

use std::sync::mpsc::channel;
use std::sync::Arc;

use async_channel::Receiver;
use log::{info, warn};

use crate::core::{ChunkIoError, MtResource, ProviderConfig};
use crate::world::{chunk::chunk_position, ChunkGenerator, ChunkLoader, ChunkPosition};

use chunk_cache::ChunkCache;
use load_ticket::LoadTicket;
use save_queue::{SaveQueue, SaveWorker, SaveWorkerHealth, SaveWorkerStatus};
use task_management::TaskManager;
use tasks::chunk_load_task::ChunkLoadTask;

/// What happened to outstanding work when the provider was shut down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub loads_completed: usize,
    pub saves_persisted: usize,
    /// Positions still queued that will never be saved because the save worker
    /// had already failed.
    pub saves_dropped: usize,
    pub save_worker: SaveWorkerStatus,
}

/// Non-blocking front end for loading and saving chunks through a
/// `ChunkLoader`.
///
/// Owns the chunk cache, the load workers and the save worker. Dropping the
/// provider shuts it down like `shutdown` does.
pub struct ChunkProvider<L: ChunkLoader> {
    loader: Arc<L>,
    world: Arc<L::World>,
    cache: Arc<ChunkCache<L::Chunk>>,
    generator: Option<Arc<dyn ChunkGenerator<Chunk = L::Chunk>>>,
    task_manager: TaskManager,
    save_queue: SaveQueue,
    /// Kept so the queue stays open after a failed worker has dropped its end.
    save_receiver: Receiver<ChunkPosition>,
    save_worker: SaveWorker,
    config: ProviderConfig,
    shutdown_report: Option<ShutdownReport>,
}

impl<L: ChunkLoader> ChunkProvider<L> {
    /// Builds the cache, starts the load workers and the save worker.
    ///
    /// # Errors
    /// Returns `ChunkIoError::Io` if a worker thread cannot be spawned.
    pub fn new(loader: L, world: L::World, config: ProviderConfig) -> Result<Self, ChunkIoError> {
        let config = config.normalized();
        let loader = Arc::new(loader);
        let world = Arc::new(world);
        let cache = Arc::new(ChunkCache::new(config.duplicate_policy));

        let task_manager = TaskManager::new(config.load_workers, "chunk-load-worker")?;
        let (save_queue, save_receiver) = SaveQueue::bounded(config.save_queue_capacity);
        let save_worker = SaveWorker::spawn(
            loader.clone(),
            world.clone(),
            cache.clone(),
            save_receiver.clone(),
            config.save_failure_policy,
        )?;

        info!(
            "Chunk provider started: {} load workers, save queue capacity {}",
            config.load_workers, config.save_queue_capacity
        );

        Ok(ChunkProvider {
            loader,
            world,
            cache,
            generator: None,
            task_manager,
            save_queue,
            save_receiver,
            save_worker,
            config,
            shutdown_report: None,
        })
    }

    /// Records the generator the surrounding system uses to create chunks.
    ///
    /// The provider itself never calls it.
    pub fn with_generator<G>(mut self, generator: G) -> Self
    where
        G: ChunkGenerator<Chunk = L::Chunk>,
    {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// The chunk currently cached at (x, z), if any. Never blocks on I/O.
    pub fn get_chunk_at(&self, x: i32, z: i32) -> Option<MtResource<L::Chunk>> {
        self.cache.find(x, z)
    }

    /// Starts loading the chunk at (x, z) in the background.
    ///
    /// Returns immediately. The ticket can be ignored; load failures are logged
    /// either way and never retried.
    pub fn load_chunk_at(&self, x: i32, z: i32) -> LoadTicket {
        let position = chunk_position(x, z);
        let (result_sender, result_receiver) = channel();

        let task = ChunkLoadTask::new(
            self.loader.clone(),
            self.world.clone(),
            self.cache.clone(),
            position,
            result_sender,
        );
        if !self.task_manager.publish_task(Box::new(task)) {
            warn!("Load of chunk ({}, {}) rejected, workers are stopped", x, z);
        }

        LoadTicket::new(position, result_receiver)
    }

    /// Queues the chunk at (x, z) for saving.
    ///
    /// Returns `false` without blocking when the save queue is full; the
    /// request is dropped in that case.
    pub fn save_chunk_at(&self, x: i32, z: i32) -> bool {
        self.save_queue.offer(chunk_position(x, z))
    }

    /// Drops every cached chunk at (x, z) and returns how many were removed.
    ///
    /// Does not save anything; queue a save first if the chunk was modified.
    pub fn unload_chunk_at(&self, x: i32, z: i32) -> usize {
        self.cache.remove_at(x, z)
    }

    pub fn cache(&self) -> &ChunkCache<L::Chunk> {
        &self.cache
    }

    pub fn generator(&self) -> Option<&dyn ChunkGenerator<Chunk = L::Chunk>> {
        self.generator.as_deref()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn world(&self) -> &L::World {
        &self.world
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Loads published but not yet finished.
    pub fn pending_loads(&self) -> usize {
        self.task_manager.tasks_in_flight()
    }

    /// Positions waiting in the save queue.
    pub fn pending_saves(&self) -> usize {
        self.save_queue.len()
    }

    pub fn save_worker_health(&self) -> SaveWorkerHealth {
        self.save_worker.health()
    }

    /// Finishes every published load, then saves everything still queued (if
    /// the save worker is alive) and joins all threads.
    pub fn shutdown(mut self) -> ShutdownReport {
        self.stop()
    }

    fn stop(&mut self) -> ShutdownReport {
        if let Some(report) = &self.shutdown_report {
            return report.clone();
        }

        info!(
            "Shutting down chunk provider: {} loads and {} saves pending",
            self.pending_loads(),
            self.pending_saves()
        );

        // Loads first, so queued saves can still see the chunks they produce.
        let loads_completed = self.task_manager.shutdown();

        self.save_queue.close();
        let save_worker = self.save_worker.join();
        let saves_dropped = self.save_receiver.len();
        let saves_persisted = self.save_worker.health().saved;

        if saves_dropped > 0 {
            warn!(
                "{} queued saves were never processed ({:?})",
                saves_dropped, save_worker
            );
        }

        let report = ShutdownReport {
            loads_completed,
            saves_persisted,
            saves_dropped,
            save_worker,
        };
        self.shutdown_report = Some(report.clone());
        report
    }
}

impl<L: ChunkLoader> Drop for ChunkProvider<L> {
    fn drop(&mut self) {
        self.stop();
    }
}
