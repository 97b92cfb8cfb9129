//! # Chunk Load Task
//!
//! Loads one chunk on a worker thread and adds it to the chunk cache.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use log::{debug, error};
use web_time::Instant;

use crate::{
    core::ChunkIoError,
    provider::{chunk_cache::ChunkCache, load_ticket::LoadResult, task_management::task::Task},
    world::{ChunkLoader, ChunkPosition, WorldChunk},
};

/// A task that loads the chunk at one position.
///
/// On success the chunk is added to the cache. On failure the error is logged
/// and the cache is left untouched; nothing is retried. A chunk whose position
/// differs from the requested one counts as a failure. Either way the outcome
/// is sent to the caller's `LoadTicket` if it is still listening.
pub struct ChunkLoadTask<L: ChunkLoader> {
    loader: Arc<L>,
    world: Arc<L::World>,
    cache: Arc<ChunkCache<L::Chunk>>,
    position: ChunkPosition,
    result_sender: Sender<LoadResult>,
}

impl<L: ChunkLoader> ChunkLoadTask<L> {
    pub fn new(
        loader: Arc<L>,
        world: Arc<L::World>,
        cache: Arc<ChunkCache<L::Chunk>>,
        position: ChunkPosition,
        result_sender: Sender<LoadResult>,
    ) -> Self {
        ChunkLoadTask {
            loader,
            world,
            cache,
            position,
            result_sender,
        }
    }
}

impl<L: ChunkLoader> Task for ChunkLoadTask<L> {
    fn process(self: Box<Self>) {
        let (x, z) = (self.position.x, self.position.y);
        let started = Instant::now();

        let result = match self.loader.load_chunk(&self.world, x, z) {
            Ok(chunk) if chunk.position() != self.position => {
                let loaded = chunk.position();
                error!(
                    "Loader returned chunk ({}, {}) for ({}, {}), discarding it",
                    loaded.x, loaded.y, x, z
                );
                Err(ChunkIoError::IllegalState(format!(
                    "expected chunk ({}, {}) but loaded ({}, {})",
                    x, z, loaded.x, loaded.y
                )))
            }
            Ok(chunk) => {
                self.cache.add(chunk);
                debug!("Loaded chunk ({}, {}) in {:?}", x, z, started.elapsed());
                Ok(self.position)
            }
            Err(e) => {
                error!("Failed to load chunk ({}, {}): {}", x, z, e);
                Err(e)
            }
        };

        // The caller may have dropped its ticket.
        let _ = self.result_sender.send(result);
    }
}
