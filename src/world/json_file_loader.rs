//! # JSON File Chunk Loader
//!
//! Stores every chunk as its own JSON document:
//!
//! ```text
//! <root>/<world name>/c.<x>.<z>.json
//! ```
//!
//! Chunks without a file are generated on load and only reach the disk once
//! they are saved. Saves write a temporary file next to the target and rename
//! it into place, so a crash mid-save leaves the previous version intact.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::core::ChunkIoError;

use super::chunk::{chunk_position, Chunk, ChunkPosition, WorldChunk};
use super::generator::ChunkGenerator;
use super::loader::ChunkLoader;

/// The world handle the JSON loader expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldInfo {
    pub name: String,
}

impl WorldInfo {
    pub fn new(name: impl Into<String>) -> Self {
        WorldInfo { name: name.into() }
    }
}

/// Stores every chunk as `<root>/<world>/c.<x>.<z>.json`.
///
/// Chunks that were never saved are created with the generator instead.
pub struct JsonFileChunkLoader<G> {
    root: PathBuf,
    generator: G,
}

impl<G: ChunkGenerator<Chunk = Chunk>> JsonFileChunkLoader<G> {
    pub fn new(root: impl Into<PathBuf>, generator: G) -> Self {
        JsonFileChunkLoader {
            root: root.into(),
            generator,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding the chunk at `position` in `world`.
    pub fn chunk_path(&self, world: &WorldInfo, position: ChunkPosition) -> PathBuf {
        self.root
            .join(&world.name)
            .join(format!("c.{}.{}.json", position.x, position.y))
    }

    /// Returns `true` if the chunk has been saved at least once.
    pub fn is_stored(&self, world: &WorldInfo, position: ChunkPosition) -> bool {
        self.chunk_path(world, position).is_file()
    }
}

impl<G: ChunkGenerator<Chunk = Chunk>> ChunkLoader for JsonFileChunkLoader<G> {
    type Chunk = Chunk;
    type World = WorldInfo;

    fn load_chunk(&self, world: &WorldInfo, x: i32, z: i32) -> Result<Chunk, ChunkIoError> {
        let position = chunk_position(x, z);
        let path = self.chunk_path(world, position);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored chunk at {:?}, generating", path);
                return Ok(self.generator.generate_chunk(position));
            }
            Err(e) => return Err(e.into()),
        };

        let chunk: Chunk = serde_json::from_str(&contents)?;
        if chunk.position() != position {
            return Err(ChunkIoError::IllegalState(format!(
                "{:?} holds chunk ({}, {}) instead of ({}, {})",
                path, chunk.x(), chunk.z(), x, z
            )));
        }
        if !chunk.is_well_formed() {
            return Err(ChunkIoError::IllegalState(format!(
                "{:?} holds a truncated height map",
                path
            )));
        }

        Ok(chunk)
    }

    fn save_chunk(&self, world: &WorldInfo, chunk: &Chunk) -> Result<(), ChunkIoError> {
        let path = self.chunk_path(world, chunk.position());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_vec(chunk)?)?;
        fs::rename(&temp_path, &path)?;

        debug!("Wrote chunk ({}, {}) to {:?}", chunk.x(), chunk.z(), path);
        Ok(())
    }
}
