use crate::core::ChunkIoError;

use super::chunk::WorldChunk;

/// Storage capability the provider drives from its worker threads.
///
/// Both methods block. `load_chunk` runs on one of the load workers, possibly
/// many at once; `save_chunk` only ever runs on the single save worker, so an
/// implementation never sees two concurrent saves.
///
/// `World` is passed through untouched. The provider shares one instance with
/// every worker.
pub trait ChunkLoader: Send + Sync + 'static {
    type Chunk: WorldChunk;
    type World: Send + Sync + 'static;

    fn load_chunk(&self, world: &Self::World, x: i32, z: i32)
        -> Result<Self::Chunk, ChunkIoError>;

    fn save_chunk(&self, world: &Self::World, chunk: &Self::Chunk) -> Result<(), ChunkIoError>;
}
