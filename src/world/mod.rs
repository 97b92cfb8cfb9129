//! # World Collaborators
//!
//! The provider never interprets chunk contents, never generates terrain and
//! never touches storage directly. Those capabilities are expressed as traits:
//!
//! * [`WorldChunk`]: anything that knows its own (x, z) position
//! * [`ChunkLoader`]: reads and writes chunks for an opaque world handle
//! * [`ChunkGenerator`]: creates a brand new chunk for a position
//!
//! The concrete types in this module ([`Chunk`], [`PerlinChunkGenerator`],
//! [`JsonFileChunkLoader`]) are one working implementation of each capability,
//! used by the demo binary and the integration tests.

pub mod chunk;
pub mod generator;
pub mod json_file_loader;
pub mod loader;

pub use chunk::{Chunk, ChunkPosition, WorldChunk};
pub use generator::{ChunkGenerator, PerlinChunkGenerator};
pub use json_file_loader::{JsonFileChunkLoader, WorldInfo};
pub use loader::ChunkLoader;
